// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("rule {id}: {message}")]
    Rule { id: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
