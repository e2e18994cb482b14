use std::path::PathBuf;

/// Settings for `tablift serve`; every flag has an environment fallback.
#[derive(Debug, Clone, clap::Args)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "TABLIFT_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "TABLIFT_PORT", default_value_t = 8000)]
    pub port: u16,

    /// HTML page served at /
    #[arg(
        long,
        env = "TABLIFT_INDEX",
        default_value = "app/templates/index.html",
        value_name = "FILE"
    )]
    pub index: PathBuf,

    /// Directory served under /static
    #[arg(
        long,
        env = "TABLIFT_STATIC_DIR",
        default_value = "app/static",
        value_name = "DIR"
    )]
    pub static_dir: PathBuf,

    /// Largest accepted request body, in MiB
    #[arg(long, env = "TABLIFT_MAX_UPLOAD_MB", default_value_t = 50)]
    pub max_upload_mb: usize,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn body_limit(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
