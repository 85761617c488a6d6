// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Build configuration.
//!
//! **DDD Context:** Build System
//!
//! A [`BuildConfig`] is usually read from the `[build]` table of a build
//! plan. Every field has a default, so an empty table is a valid
//! configuration.
//!
//! ```toml
//! [build]
//! class-file-version = 8
//! type-validation = true
//! method-graph = "default"
//! constructor-strategy = "imitate-super-class-opening"
//! ```

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use ecow::EcoString;
use miette::Diagnostic;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use crate::scaffold::method_graph::MethodGraphCompiler;
use crate::scaffold::subclass::ConstructorStrategy;

/// Oldest Java release the writer can target.
const MIN_RELEASE: u16 = 1;
/// Newest Java release the writer knows about.
const MAX_RELEASE: u16 = 25;
/// Class file major version of Java 5, the first release with bridge methods.
const JAVA_5_MAJOR: u16 = 49;

/// Errors raised while loading a [`BuildConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ConfigError {
    /// The TOML text could not be parsed into a configuration.
    #[error("invalid build configuration: {message}")]
    #[diagnostic(code(bytesmith::config::parse))]
    Parse {
        /// Parser message.
        message: String,
    },

    /// The requested Java release is outside the supported range.
    #[error("unsupported class file version: Java {0}")]
    #[diagnostic(
        code(bytesmith::config::class_file_version),
        help("use a Java release between 1 and 25")
    )]
    UnsupportedVersion(u16),
}

/// A class file format version, identified by its Java release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "u16")]
pub struct ClassFileVersion {
    release: u16,
}

impl ClassFileVersion {
    pub const JAVA_V1: Self = Self { release: 1 };
    pub const JAVA_V4: Self = Self { release: 4 };
    pub const JAVA_V5: Self = Self { release: 5 };
    pub const JAVA_V8: Self = Self { release: 8 };
    pub const JAVA_V11: Self = Self { release: 11 };
    pub const JAVA_V17: Self = Self { release: 17 };

    /// The version for a Java release (`8` for Java 8).
    pub fn of_release(release: u16) -> Result<Self, ConfigError> {
        if (MIN_RELEASE..=MAX_RELEASE).contains(&release) {
            Ok(Self { release })
        } else {
            Err(ConfigError::UnsupportedVersion(release))
        }
    }

    #[must_use]
    pub fn release(self) -> u16 {
        self.release
    }

    /// Class file major version (`52` for Java 8).
    #[must_use]
    pub fn major(self) -> u16 {
        if self.release == 1 {
            45
        } else {
            self.release + 44
        }
    }

    /// Returns true if this format can express bridge methods.
    #[must_use]
    pub fn supports_bridges(self) -> bool {
        self.major() >= JAVA_5_MAJOR
    }
}

impl Default for ClassFileVersion {
    fn default() -> Self {
        Self::JAVA_V8
    }
}

impl TryFrom<u16> for ClassFileVersion {
    type Error = ConfigError;

    fn try_from(release: u16) -> Result<Self, Self::Error> {
        Self::of_release(release)
    }
}

impl fmt::Display for ClassFileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Java {} (major {})", self.release, self.major())
    }
}

/// Settings that shape a single build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildConfig {
    /// Target class file format.
    pub class_file_version: ClassFileVersion,
    /// Validate the instrumented type before compiling its methods.
    pub type_validation: bool,
    /// How inherited methods are collected.
    pub method_graph: MethodGraphCompiler,
    /// Which constructors the subclass receives.
    pub constructor_strategy: ConstructorStrategy,
    /// Infix used when naming auxiliary types.
    pub auxiliary_suffix: EcoString,
    /// Suffix appended to the names of rebased methods.
    pub rebase_suffix: EcoString,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            class_file_version: ClassFileVersion::default(),
            type_validation: true,
            method_graph: MethodGraphCompiler::default(),
            constructor_strategy: ConstructorStrategy::default(),
            auxiliary_suffix: "auxiliary".into(),
            rebase_suffix: "original".into(),
        }
    }
}

impl BuildConfig {
    /// Parses the `[build]` table of a TOML document.
    ///
    /// Other top-level tables are ignored; a missing `[build]` table yields
    /// the defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let document: toml::Table = toml::from_str(source).map_err(parse_error)?;
        match document.get("build") {
            Some(build) => build.clone().try_into().map_err(parse_error),
            None => Ok(Self::default()),
        }
    }
}

fn parse_error(err: toml::de::Error) -> ConfigError {
    ConfigError::Parse {
        message: err.message().to_string(),
    }
}
