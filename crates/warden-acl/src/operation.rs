//! Catalog operation taxonomy.
//!
//! Every operation a catalog exposes is a variant of [`Operation`], bound
//! at compile time to the [`PolicyTemplate`] that authorizes it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use warden_core::{Error, Result};

use crate::template::PolicyTemplate;

/// Whether an operation only reads the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationClass {
    /// Read-only; eligible for global read access.
    Read,
    /// Mutates the catalog.
    Write,
}

impl fmt::Display for OperationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

macro_rules! operations {
    ($($variant:ident => $name:literal, $class:ident, $template:ident;)+) => {
        /// A catalog operation subject to authorization.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub enum Operation {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl Operation {
            /// Every operation, in table order.
            pub const ALL: &'static [Operation] = &[$(Self::$variant,)+];

            /// The wire name of the operation.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            /// Read or write class.
            pub fn class(&self) -> OperationClass {
                match self {
                    $(Self::$variant => OperationClass::$class,)+
                }
            }

            /// The template that authorizes the operation.
            pub fn template(&self) -> PolicyTemplate {
                match self {
                    $(Self::$variant => PolicyTemplate::$template,)+
                }
            }
        }
    };
}

operations! {
    RemoveDirectory => "removeDirectory", Write, RemoveDirectory;
    CreateDirectory => "createDirectory", Write, WriteForFileOrDirectory;
    AddFile => "addFile", Write, WriteForFileOrDirectory;
    RemoveFile => "removeFile", Write, RemoveFile;
    SetFileMode => "setFileMode", Write, WriteOnFile;
    AddFileAncestors => "addFileAncestors", Write, WriteOnFile;
    SetFileStatus => "setFileStatus", Write, WriteOnFile;
    AddReplica => "addReplica", Write, WriteOnFile;
    RemoveReplica => "removeReplica", Write, WriteOnFile;
    SetReplicaStatus => "setReplicaStatus", Write, WriteOnFile;
    SetReplicaHost => "setReplicaHost", Write, WriteOnFile;
    ListDirectory => "listDirectory", Read, ListDirectory;
    IsDirectory => "isDirectory", Read, ReadForFileOrDirectory;
    GetDirectoryReplicas => "getDirectoryReplicas", Read, ReadForFileOrDirectory;
    GetDirectoryMetadata => "getDirectoryMetadata", Read, ReadForFileOrDirectory;
    GetDirectorySize => "getDirectorySize", Read, ReadForFileOrDirectory;
    IsFile => "isFile", Read, ReadForFileOrDirectory;
    GetFileSize => "getFileSize", Read, ReadForFileOrDirectory;
    GetFileMetadata => "getFileMetadata", Read, ReadForFileOrDirectory;
    Exists => "exists", Read, ReadForFileOrDirectory;
    GetFileAncestors => "getFileAncestors", Read, ReadForFileOrDirectory;
    GetFileDescendents => "getFileDescendents", Read, ReadForFileOrDirectory;
    GetReplicas => "getReplicas", Read, ReadForReplica;
    GetReplicaStatus => "getReplicaStatus", Read, ReadForReplica;
    ChangePathOwner => "changePathOwner", Write, Deny;
    ChangePathGroup => "changePathGroup", Write, Deny;
    SetFileOwner => "setFileOwner", Write, Deny;
    SetFileGroup => "setFileGroup", Write, Deny;
    ChangePathMode => "changePathMode", Write, ChangePathMode;
}

impl Operation {
    /// Returns `true` for read-class operations.
    pub fn is_read(&self) -> bool {
        self.class() == OperationClass::Read
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name() == s)
            .ok_or_else(|| Error::invalid_operation(s))
    }
}
