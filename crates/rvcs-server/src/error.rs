use rvcs_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no free port on {host} among {ports:?}")]
    NoFreePort { host: String, ports: Vec<u16> },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
