// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op extensions for hosts that never suspend work.

use super::{BackgroundExtension, ExpiryCallback, ExtensionId};

/// Declines every extension request.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpExtensions;

impl NoOpExtensions {
    pub fn new() -> Self {
        Self
    }
}

impl BackgroundExtension for NoOpExtensions {
    fn begin(&self, _provider: &str, _on_expire: ExpiryCallback) -> Option<ExtensionId> {
        None
    }

    fn end(&self, _id: ExtensionId) {}
}
