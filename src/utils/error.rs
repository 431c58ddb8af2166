use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file")]
    Parse {
        #[from]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Region lies outside the image: {width}x{height} at ({x}, {y})")]
    EmptyRegion {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
}
