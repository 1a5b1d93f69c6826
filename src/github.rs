pub mod client;

pub use client::{GithubClient, RepoLookup};
