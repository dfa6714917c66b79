//! Kubernetes integration module for PodKiller
//!
//! This module handles all interactions with the cluster:
//! - Listing, reading and deleting pods
//! - Listing namespaces
//! - Executing commands inside pods (used for fault injection)

mod client;
mod cluster;

pub use client::K8sClient;
pub use cluster::{ClusterApi, ExecOutput};
