pub mod load_config;
