// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The ParameterSetup tree (spec.md §3/§9): a nested interval tree keyed by
//! (time, group-or-member name) assigning mutable parameter overrides.
//! Grounded in `XML/ParameterSetup.cpp`/`XML/ParameterGroup.h` of the
//! original implementation.

use hifitime::Epoch;
use thiserror::Error;

/// How a child setup node's parameters take effect at its boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Applied instantaneously at the boundary.
    Hard,
    /// Interpolated across the boundary (spec.md §3).
    Smooth,
}

/// Either a named group or a single named member (station/source/baseline).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberRef {
    Group(String),
    Member(String),
}

/// One node of the setup tree: a time span, the members it applies to, an
/// opaque parameter-override payload, and any children.
#[derive(Clone, Debug)]
pub struct SetupNode<P> {
    pub start: Epoch,
    pub end: Epoch,
    pub members: Vec<MemberRef>,
    pub transition: Transition,
    pub parameters: P,
    pub children: Vec<SetupNode<P>>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupTreeError {
    #[error("setup node [{0}, {1}) lies outside its parent's span")]
    ChildOutsideParent(String, String),
    #[error("sibling nodes overlap in both time and members")]
    OverlappingSiblings,
    #[error("setup node references unknown member {0:?}")]
    UnknownMember(MemberRef),
}

impl<P> SetupNode<P> {
    pub fn new(start: Epoch, end: Epoch, members: Vec<MemberRef>, parameters: P) -> Self {
        Self {
            start,
            end,
            members,
            transition: Transition::Hard,
            parameters,
            children: Vec::new(),
        }
    }

    /// Validate this node's invariants (spec.md §3): every child's time
    /// span lies within its parent's, and overlapping siblings must have
    /// disjoint member sets.
    pub fn validate(&self) -> Result<(), SetupTreeError> {
        for child in &self.children {
            if child.start < self.start || child.end > self.end {
                return Err(SetupTreeError::ChildOutsideParent(
                    format!("{:?}", child.start),
                    format!("{:?}", child.end),
                ));
            }
            child.validate()?;
        }
        for i in 0..self.children.len() {
            for j in (i + 1)..self.children.len() {
                let a = &self.children[i];
                let b = &self.children[j];
                let time_overlap = a.start < b.end && b.start < a.end;
                let member_overlap = a.members.iter().any(|m| b.members.contains(m));
                if time_overlap && member_overlap {
                    return Err(SetupTreeError::OverlappingSiblings);
                }
            }
        }
        Ok(())
    }

    /// Insert `child` into this node's children, re-validating afterwards.
    /// Mirrors the original's `addChild`/`deleteChild` pair (spec.md §8's
    /// idempotence property: `addChild` then `deleteChild` restores the
    /// tree).
    pub fn add_child(&mut self, child: SetupNode<P>) -> Result<(), SetupTreeError>
    where
        P: Clone,
    {
        self.children.push(child);
        if let Err(e) = self.validate() {
            self.children.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Remove the child at `index`, if present.
    pub fn delete_child(&mut self, index: usize) -> Option<SetupNode<P>> {
        if index < self.children.len() {
            Some(self.children.remove(index))
        } else {
            None
        }
    }

    /// Walk the tree once, returning the innermost (deepest) node whose
    /// span contains `epoch` and whose members include `member` (directly,
    /// or via a group listed in `groups`), falling back to `self` if none
    /// match -- i.e. parameter resolution by nearest enclosing override,
    /// per spec.md §9.
    pub fn resolve<'a>(
        &'a self,
        epoch: Epoch,
        member: &str,
        groups: &std::collections::HashMap<String, Vec<String>>,
    ) -> &'a SetupNode<P> {
        for child in &self.children {
            let applies = child.start <= epoch
                && epoch < child.end
                && child.members.iter().any(|m| match m {
                    MemberRef::Member(n) => n == member,
                    MemberRef::Group(g) => groups
                        .get(g)
                        .map(|members| members.iter().any(|n| n == member))
                        .unwrap_or(false),
                });
            if applies {
                return child.resolve(epoch, member, groups);
            }
        }
        self
    }
}
