//! Shared building blocks for the NewTube backend
//!
//! [`database`] owns the PostgreSQL pool and the embedded migrations;
//! [`error`] holds the error type every HTTP handler returns, rendered as
//! `{"error": "<message>"}` bodies.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, init_pool, run_migrations};
//!
//! # async fn boot() -> anyhow::Result<()> {
//! let pool = init_pool(&DatabaseConfig::from_env()?).await?;
//! run_migrations(&pool).await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod error;

pub use error::{ApiError, ApiJson, ApiResult};
