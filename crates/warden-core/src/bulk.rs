//! Partitioned outcome of a multi-path evaluation.
//!
//! A [`BulkResult`] holds one entry per input path, either in the
//! `Successful` map (with its value) or in the `Failed` map (with an error
//! message), never both. Every mutating method preserves that partition, so
//! a single failing path can never knock out its siblings.
//!
//! # Usage
//!
//! ```rust
//! use warden_core::{BulkResult, Error};
//!
//! let outcomes = vec![
//!     ("/vo/a".to_string(), Ok(true)),
//!     ("/vo/b".to_string(), Err(Error::backend("timeout"))),
//! ];
//! let result = BulkResult::from_outcomes(outcomes);
//! assert_eq!(result.successful().get("/vo/a"), Some(&true));
//! assert!(result.failed().contains_key("/vo/b"));
//! assert_eq!(result.len(), 2);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Per-path success/failure partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BulkResult<T> {
    successful: BTreeMap<String, T>,
    failed: BTreeMap<String, String>,
}

impl<T> Default for BulkResult<T> {
    fn default() -> Self {
        Self {
            successful: BTreeMap::new(),
            failed: BTreeMap::new(),
        }
    }
}

impl<T> BulkResult<T> {
    /// Creates an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a result where every path succeeded with the same value.
    pub fn uniform<I, S>(paths: I, value: T) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        T: Clone,
    {
        let mut result = Self::new();
        for path in paths {
            result.insert_ok(path, value.clone());
        }
        result
    }

    /// Builds a result where every path failed with the same message.
    pub fn fail_all<I, S>(paths: I, message: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut result = Self::new();
        for path in paths {
            result.insert_err(path, message);
        }
        result
    }

    /// Collects `(path, outcome)` pairs into a partitioned result.
    pub fn from_outcomes<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (String, Result<T>)>,
    {
        let mut result = Self::new();
        for (path, outcome) in outcomes {
            result.record(path, outcome);
        }
        result
    }

    /// Evaluates `f` for every path concurrently and partitions the outcomes.
    ///
    /// Duplicate paths are evaluated once.
    pub async fn evaluate<I, S, F, Fut>(paths: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let unique: BTreeSet<String> = paths.into_iter().map(Into::into).collect();
        let outcomes = join_all(unique.into_iter().map(|path| {
            let fut = f(path.clone());
            async move { (path, fut.await) }
        }))
        .await;
        Self::from_outcomes(outcomes)
    }

    /// Records a success, replacing any earlier entry for `path`.
    pub fn insert_ok(&mut self, path: impl Into<String>, value: T) {
        let path = path.into();
        self.failed.remove(&path);
        self.successful.insert(path, value);
    }

    /// Records a failure, replacing any earlier entry for `path`.
    pub fn insert_err(&mut self, path: impl Into<String>, message: impl Into<String>) {
        let path = path.into();
        self.successful.remove(&path);
        self.failed.insert(path, message.into());
    }

    /// Records either outcome.
    pub fn record(&mut self, path: impl Into<String>, outcome: Result<T>) {
        match outcome {
            Ok(value) => self.insert_ok(path, value),
            Err(err) => self.insert_err(path, err.to_string()),
        }
    }

    /// Merges `other` into `self`; entries of `other` win on collision.
    pub fn merge(&mut self, other: BulkResult<T>) {
        for (path, value) in other.successful {
            self.insert_ok(path, value);
        }
        for (path, message) in other.failed {
            self.insert_err(path, message);
        }
    }

    /// Maps every successful value, keeping the failures.
    pub fn map<U, F>(self, mut f: F) -> BulkResult<U>
    where
        F: FnMut(T) -> U,
    {
        BulkResult {
            successful: self
                .successful
                .into_iter()
                .map(|(path, value)| (path, f(value)))
                .collect(),
            failed: self.failed,
        }
    }

    /// Paths that succeeded, with their values.
    pub fn successful(&self) -> &BTreeMap<String, T> {
        &self.successful
    }

    /// Paths that failed, with their error messages.
    pub fn failed(&self) -> &BTreeMap<String, String> {
        &self.failed
    }

    /// Returns `true` if `path` is present in either partition.
    pub fn contains(&self, path: &str) -> bool {
        self.successful.contains_key(path) || self.failed.contains_key(path)
    }

    /// Every path present in the result.
    pub fn paths(&self) -> BTreeSet<&str> {
        self.successful
            .keys()
            .chain(self.failed.keys())
            .map(String::as_str)
            .collect()
    }

    /// Total number of paths.
    pub fn len(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    /// Returns `true` if the result holds no path.
    pub fn is_empty(&self) -> bool {
        self.successful.is_empty() && self.failed.is_empty()
    }
}
