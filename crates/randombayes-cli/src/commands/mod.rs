pub mod evaluate;
pub mod input;
pub mod select;
pub mod train;
