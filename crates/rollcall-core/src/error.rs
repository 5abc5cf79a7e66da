use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignupError {
    #[error("store error: {0}")]
    Store(#[from] rollcall_store::StoreError),
}
