//! Command-line argument surface for the merge engine.
//!
//! This crate defines the argument structs only; wiring them to an actual
//! binary that reads a source tree, builds an orchestrator, and prints a
//! report is out of scope here (the target install environment's directory
//! layout and output format are a packaging concern, not a merge-engine
//! one). Downstream binaries parse these with `clap` and drive
//! `confmerge-orchestrator` directly.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level verb, mirroring the three entry points spec §2 names.
#[derive(Debug, Subcommand)]
pub enum Verb {
    /// Merge a source config tree into the live tree and restart affected services.
    Merge(MergeArgs),
    /// Merge, but refuse any change the preserve-network guard would block.
    SafeMerge(SafeMergeArgs),
    /// Remove sections from the live tree matching a target tree's shape.
    Remove(RemoveArgs),
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Directory containing the incoming package tree to merge.
    #[arg(long)]
    pub source: PathBuf,

    /// Compute conflicts and changes but do not commit or restart anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Refuse any change that would strand the management interface or
    /// default gateway.
    #[arg(long)]
    pub preserve_network: bool,

    /// Run the list deduplicator over merged lists.
    #[arg(long)]
    pub dedupe_lists: bool,

    /// On an option conflict, take the incoming value instead of keeping
    /// the current one (the inverse of preserve-existing, which is the
    /// default).
    #[arg(long)]
    pub prefer_incoming: bool,

    /// Skip the restart plan and restart phase entirely after commit.
    #[arg(long)]
    pub no_restart: bool,

    /// Disable the automatic rollback a restart failure or deadline
    /// overrun would otherwise trigger (rollback-on-failure is on by
    /// default).
    #[arg(long)]
    pub no_rollback_on_failure: bool,

    #[arg(long)]
    pub verbose: bool,

    #[arg(long)]
    pub quiet: bool,
}

/// Identical surface to [`MergeArgs`] minus the flags it implies — this is
/// the variant meant for unattended provisioning flows, where a bad
/// incoming tree must never strand the management interface. It always
/// behaves as if preserve-network, dedupe-lists, and preserve-existing were
/// passed to `merge`; there is no flag to turn any of the three off.
#[derive(Debug, Args)]
pub struct SafeMergeArgs {
    #[arg(long)]
    pub source: PathBuf,

    #[arg(long)]
    pub dry_run: bool,

    #[arg(long)]
    pub no_restart: bool,

    #[arg(long)]
    pub no_rollback_on_failure: bool,

    #[arg(long)]
    pub verbose: bool,

    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Directory containing the target tree whose sections should be
    /// removed from the live tree wherever they match.
    #[arg(long)]
    pub target: PathBuf,

    #[arg(long)]
    pub dry_run: bool,

    #[arg(long)]
    pub no_restart: bool,

    #[arg(long)]
    pub no_rollback_on_failure: bool,

    /// Skip the interactive confirmation prompt a front-end would
    /// otherwise show before removing sections. The prompt itself lives in
    /// whatever binary wires this crate up, not here; this flag exists so
    /// that binary has something to gate on.
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(subcommand)]
        verb: Verb,
    }

    #[test]
    fn merge_args_parse_from_flags() {
        let cli = TestCli::parse_from(["confmerge", "merge", "--source", "/tmp/src", "--dry-run"]);
        match cli.verb {
            Verb::Merge(args) => {
                assert_eq!(args.source, PathBuf::from("/tmp/src"));
                assert!(args.dry_run);
                assert!(!args.dedupe_lists);
                assert!(!args.no_restart);
                assert!(!args.no_rollback_on_failure);
            }
            _ => panic!("expected Merge"),
        }
    }

    #[test]
    fn merge_args_parse_restart_and_rollback_overrides() {
        let cli = TestCli::parse_from([
            "confmerge",
            "merge",
            "--source",
            "/tmp/src",
            "--no-restart",
            "--no-rollback-on-failure",
            "--preserve-network",
        ]);
        match cli.verb {
            Verb::Merge(args) => {
                assert!(args.no_restart);
                assert!(args.no_rollback_on_failure);
                assert!(args.preserve_network);
            }
            _ => panic!("expected Merge"),
        }
    }

    #[test]
    fn safe_merge_args_parse_from_flags() {
        let cli = TestCli::parse_from(["confmerge", "safe-merge", "--source", "/tmp/src"]);
        assert!(matches!(cli.verb, Verb::SafeMerge(_)));
    }

    #[test]
    fn safe_merge_args_parse_no_restart_flag() {
        let cli = TestCli::parse_from(["confmerge", "safe-merge", "--source", "/tmp/src", "--no-restart"]);
        match cli.verb {
            Verb::SafeMerge(args) => assert!(args.no_restart),
            _ => panic!("expected SafeMerge"),
        }
    }

    #[test]
    fn remove_args_parse_from_flags() {
        let cli = TestCli::parse_from(["confmerge", "remove", "--target", "/tmp/tgt"]);
        match cli.verb {
            Verb::Remove(args) => {
                assert_eq!(args.target, PathBuf::from("/tmp/tgt"));
                assert!(!args.force);
            }
            _ => panic!("expected Remove"),
        }
    }

    #[test]
    fn remove_args_parse_force_flag() {
        let cli = TestCli::parse_from(["confmerge", "remove", "--target", "/tmp/tgt", "--force"]);
        match cli.verb {
            Verb::Remove(args) => assert!(args.force),
            _ => panic!("expected Remove"),
        }
    }
}
