// SPDX-License-Identifier: MIT

//! Aggregate status of a set of jobs

use std::collections::HashSet;

use super::core::StatusKind;

/// A job status as seen by the aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Composite {
    Status(StatusKind),
    /// A failure that was allowed
    SuccessWithWarnings,
    /// A manual job that may be skipped without blocking
    Ignored,
}

impl Composite {
    pub fn of(status: StatusKind, allow_failure: bool) -> Self {
        match status {
            StatusKind::Failed | StatusKind::Canceled if allow_failure => {
                Composite::SuccessWithWarnings
            }
            StatusKind::Manual if allow_failure => Composite::Ignored,
            status => Composite::Status(status),
        }
    }

    /// Fold a set of job statuses into one
    pub fn status_of(statuses: impl IntoIterator<Item = Composite>) -> StatusKind {
        let present: HashSet<Composite> = statuses.into_iter().collect();
        Tally(&present).status()
    }

    /// Whether the set contains an allowed failure
    pub fn has_warnings(statuses: impl IntoIterator<Item = Composite>) -> bool {
        statuses
            .into_iter()
            .any(|status| status == Composite::SuccessWithWarnings)
    }
}

struct Tally<'a>(&'a HashSet<Composite>);

impl Tally<'_> {
    fn any(&self, status: StatusKind) -> bool {
        self.0.contains(&Composite::Status(status))
    }

    /// Every present status is one of `allowed`, warnings and ignored jobs
    /// always being tolerated
    fn only(&self, allowed: &[StatusKind]) -> bool {
        self.0.iter().all(|composite| match composite {
            Composite::Status(status) => allowed.contains(status),
            Composite::SuccessWithWarnings | Composite::Ignored => true,
        })
    }

    fn only_strict(&self, allowed: &[StatusKind]) -> bool {
        self.0.iter().all(|composite| match composite {
            Composite::Status(status) => allowed.contains(status),
            Composite::Ignored => true,
            Composite::SuccessWithWarnings => false,
        })
    }

    fn status(&self) -> StatusKind {
        use StatusKind::*;

        if self.0.is_empty() || self.only_strict(&[Skipped]) {
            Skipped
        } else if self.only(&[Success, Skipped]) {
            Success
        } else if self.only(&[Created]) {
            Created
        } else if self.only(&[Preparing]) {
            Preparing
        } else if self.only(&[Canceled, Success, Skipped]) {
            Canceled
        } else if self.only(&[Pending, Created, Skipped]) {
            Pending
        } else if self.any(Running) || self.any(Pending) {
            Running
        } else if self.any(WaitingForResource) {
            WaitingForResource
        } else if self.any(Manual) {
            Manual
        } else if self.any(Scheduled) {
            Scheduled
        } else if self.any(Preparing) {
            Preparing
        } else if self.any(Created) {
            Running
        } else {
            Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use StatusKind::*;

    fn status(statuses: &[(StatusKind, bool)]) -> StatusKind {
        Composite::status_of(statuses.iter().map(|&(s, allow)| Composite::of(s, allow)))
    }

    #[test]
    fn test_empty_is_skipped() {
        assert_eq!(status(&[]), Skipped);
        assert_eq!(status(&[(Skipped, false), (Skipped, false)]), Skipped);
    }

    #[test]
    fn test_only_ignored_is_skipped() {
        assert_eq!(status(&[(Manual, true)]), Skipped);
    }

    #[test]
    fn test_success_with_skipped() {
        assert_eq!(status(&[(Success, false), (Skipped, false)]), Success);
    }

    #[test]
    fn test_allowed_failure_counts_as_success() {
        assert_eq!(status(&[(Success, false), (Failed, true)]), Success);
        assert!(Composite::has_warnings([Composite::of(Failed, true)]));
        assert!(!Composite::has_warnings([Composite::of(Failed, false)]));
    }

    #[test]
    fn test_failure() {
        assert_eq!(status(&[(Success, false), (Failed, false)]), Failed);
    }

    #[test]
    fn test_canceled() {
        assert_eq!(status(&[(Success, false), (Canceled, false)]), Canceled);
    }

    #[test]
    fn test_created_and_pending() {
        assert_eq!(status(&[(Created, false)]), Created);
        assert_eq!(status(&[(Created, false), (Pending, false)]), Pending);
    }

    #[test]
    fn test_running_wins_over_blocking_statuses() {
        assert_eq!(status(&[(Running, false), (Manual, false)]), Running);
        assert_eq!(status(&[(Success, false), (Created, false)]), Running);
    }

    #[test]
    fn test_manual_blocks() {
        assert_eq!(status(&[(Success, false), (Manual, false)]), Manual);
        assert_eq!(status(&[(Success, false), (Scheduled, false)]), Scheduled);
        assert_eq!(
            status(&[(Manual, false), (WaitingForResource, false)]),
            WaitingForResource
        );
    }

    #[test]
    fn test_preparing() {
        assert_eq!(status(&[(Preparing, false)]), Preparing);
        assert_eq!(status(&[(Preparing, false), (Success, false)]), Preparing);
    }
}
