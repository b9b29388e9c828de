/// Infrastructure integrations

pub mod postgres;
