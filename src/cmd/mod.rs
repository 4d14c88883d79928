//! CLI command implementations.
//!
//! | Module          | Commands handled                                   |
//! |-----------------|-----------------------------------------------------|
//! | `serve`         | `Serve`                                            |
//! | `db`            | `InitDb`                                           |
//! | `config`        | `CheckConfig`, `InitConfig`                        |

pub mod config;
pub mod db;
pub mod serve;

pub use config::{cmd_check_config, cmd_init_config};
pub use db::cmd_init_db;
pub use serve::{ServeOverrides, cmd_serve};
