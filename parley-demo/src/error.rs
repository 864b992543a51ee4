#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("refusing to connect to {0:?} without https")]
    InsecureHost(String),
}
