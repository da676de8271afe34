//! Walks a repository, submits each eligible file to a remote quick-command
//! analysis service, drives the asynchronous job to completion and files every
//! finding in the configured issue trackers.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod report;
pub mod sanitize;
pub mod select;
pub mod service;
pub mod submit;
pub mod tracker;
pub mod translate;
pub mod util;
