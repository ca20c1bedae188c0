//! Which wrapper specialization is being expanded, and for which call site.
//!
//! The stack is a borrowed chain: pushing creates a [`ScopeGuard`] on the caller's stack frame
//! that links back to its parent, and the child view handed to nested work borrows that guard.
//! When the guard goes out of scope the parent view is what the caller still holds, so the
//! previous frame is current again on every exit path without any shared mutable slot.

use cw_core::ast::{DeclId, NodeId};
use std::fmt::{Display, Formatter};
use tracing::trace;

/// The wrapper specialization being instantiated and the expression that referenced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeFrame {
    pub wrapper: DeclId,
    pub callsite: NodeId,
}

impl Display for ScopeFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.wrapper, self.callsite)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeStack<'a> {
    top: Option<&'a ScopeGuard<'a>>,
}

impl<'a> ScopeStack<'a> {
    pub const fn empty() -> Self {
        Self { top: None }
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    pub fn current(&self) -> Option<ScopeFrame> {
        self.top.map(|guard| guard.frame)
    }

    /// Makes `frame` current for as long as the returned guard lives.
    pub fn push(self, frame: ScopeFrame) -> ScopeGuard<'a> {
        trace!("entering wrapper scope {}", frame);
        ScopeGuard {
            frame,
            parent: self,
        }
    }

    /// Active frames, innermost first.
    pub fn frames(&self) -> Frames<'a> {
        Frames { next: self.top }
    }

    pub fn depth(&self) -> usize {
        self.frames().count()
    }
}

/// A pushed frame. Borrow it through [`ScopeGuard::scope`] to see it as current.
#[derive(Debug)]
pub struct ScopeGuard<'a> {
    frame: ScopeFrame,
    parent: ScopeStack<'a>,
}

impl<'a> ScopeGuard<'a> {
    pub fn frame(&self) -> ScopeFrame {
        self.frame
    }

    pub fn scope(&self) -> ScopeStack<'_> {
        ScopeStack { top: Some(self) }
    }

    pub fn parent(&self) -> ScopeStack<'a> {
        self.parent
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        trace!("leaving wrapper scope {}", self.frame);
    }
}

pub struct Frames<'a> {
    next: Option<&'a ScopeGuard<'a>>,
}

impl Iterator for Frames<'_> {
    type Item = ScopeFrame;

    fn next(&mut self) -> Option<Self::Item> {
        let guard = self.next?;
        self.next = guard.parent.top;
        Some(guard.frame)
    }
}
