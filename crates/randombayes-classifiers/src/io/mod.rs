pub mod csv_loader;

pub use csv_loader::{
    align_to_schema, read_dataset, read_dataset_with_config, read_for_schema, write_predictions,
    DatasetReaderConfig,
};
