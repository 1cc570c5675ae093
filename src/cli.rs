// src/cli.rs
//! CLI definitions for extcat
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "extcat")]
#[command(version)]
#[command(about = "Extension catalogue server and client", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the catalogue server
    Serve {
        /// Address to listen on (default: 127.0.0.1:8765)
        #[arg(short, long)]
        bind: Option<SocketAddr>,

        /// JSON catalogue to serve instead of the bundled one
        #[arg(long)]
        catalogue: Option<PathBuf>,
    },

    /// Search the catalogue once and print the matches
    Search {
        /// Keyword to match against name, description, author and tags
        #[arg(default_value = "")]
        keyword: String,

        /// Catalogue server base URL
        #[arg(short, long)]
        endpoint: Option<String>,
    },

    /// Install an extension
    Install {
        /// Extension id (e.g. salome.mesh)
        id: String,

        /// Catalogue server base URL
        #[arg(short, long)]
        endpoint: Option<String>,
    },

    /// Uninstall an extension
    Uninstall {
        /// Extension id
        id: String,

        /// Catalogue server base URL
        #[arg(short, long)]
        endpoint: Option<String>,
    },

    /// Interactive session: type to search, :install/:uninstall to act
    Browse {
        /// Catalogue server base URL
        #[arg(short, long)]
        endpoint: Option<String>,
    },
}
