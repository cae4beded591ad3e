//! Tree differ - two-sided reconciliation of a directory pair

use super::policy::{forward_actions, reverse_action};
use crate::config::{check_disjoint_roots, Config};
use crate::executor::{
    emit_event, execute_action, ExecutionCallback, ExecutionEvent, ExecutionStats,
};
use crate::scanner::{list_directory, stat_entry, Symlinks};
use crate::types::{map_fs_error, DirectoryPair, SyncAction, SyncError};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

/// Per-pass settings the differ needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Descend into subdirectories
    pub recursive: bool,
    /// Copy-strategy threshold in bytes
    pub threshold: u64,
}

impl SyncOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            recursive: config.recursive,
            threshold: config.mmap_threshold,
        }
    }
}

/// Reconcile `pair.dest` against `pair.source`, recursing when enabled.
///
/// Per level the source is walked first (copies, new directories, descent)
/// and then the destination (orphan removal). Only the destination is ever
/// written. Errors are reported through `on_event` and counted; they never
/// stop the pass.
///
/// If the source directory of a level cannot be listed, that level's
/// destination is left untouched instead of being treated as empty.
///
/// Source symlinks are followed. Destination symlinks never are: a link in
/// the destination is an entry of its own that gets replaced or unlinked.
///
/// # Example
/// ```no_run
/// use syncdaemon::diff::{synchronize, SyncOptions};
/// use syncdaemon::types::DirectoryPair;
///
/// let options = SyncOptions { recursive: true, threshold: 1024 * 1024 };
/// let stats = synchronize(&DirectoryPair::new("/data/src", "/data/dst"), &options, None);
/// println!("copied {} files", stats.files_copied);
/// ```
pub fn synchronize(
    pair: &DirectoryPair,
    options: &SyncOptions,
    on_event: Option<&ExecutionCallback>,
) -> ExecutionStats {
    let mut pass = Pass {
        options,
        on_event,
        stats: ExecutionStats::default(),
        ancestors: Vec::new(),
    };
    match overlapping_roots(pair) {
        Some(error) => pass.report(error),
        None => pass.sync_level(pair),
    }

    emit_event(
        on_event,
        ExecutionEvent::Complete {
            stats: pass.stats.clone(),
        },
    );
    pass.stats
}

/// Equal or nested roots are refused: the destination must never reach into the source.
fn overlapping_roots(pair: &DirectoryPair) -> Option<SyncError> {
    // Unresolvable roots are reported by the pass itself.
    let source = fs::canonicalize(&pair.source).ok()?;
    let dest = fs::canonicalize(&pair.dest).ok()?;
    check_disjoint_roots(&source, &dest).err()
}

struct Pass<'a> {
    options: &'a SyncOptions,
    on_event: Option<&'a ExecutionCallback>,
    stats: ExecutionStats,
    // Canonical source directories on the current recursion path
    ancestors: Vec<PathBuf>,
}

impl Pass<'_> {
    fn sync_level(&mut self, pair: &DirectoryPair) {
        let canonical = match fs::canonicalize(&pair.source) {
            Ok(path) => path,
            Err(e) => {
                self.report(map_fs_error(&pair.source, e));
                return;
            }
        };
        if self.ancestors.contains(&canonical) {
            self.report(SyncError::Cycle {
                path: pair.source.clone(),
            });
            return;
        }

        self.stats.dirs_visited += 1;
        emit_event(
            self.on_event,
            ExecutionEvent::EnterDirectory { pair: pair.clone() },
        );

        self.ancestors.push(canonical);
        let mut entered = HashSet::new();
        if self.forward_pass(pair, &mut entered) {
            self.reverse_pass(pair, &mut entered);
        }
        self.ancestors.pop();
    }

    /// Returns `false` when the source could not be listed.
    fn forward_pass(&mut self, pair: &DirectoryPair, entered: &mut HashSet<OsString>) -> bool {
        let listing = match list_directory(&pair.source, Symlinks::Follow) {
            Ok(listing) => listing,
            Err(error) => {
                self.report(error);
                return false;
            }
        };
        for error in listing.errors {
            self.report(error);
        }

        for src in &listing.entries {
            let dest = match stat_entry(&pair.dest_path(&src.name), Symlinks::Preserve) {
                Ok(dest) => dest,
                Err(error) => {
                    self.report(error);
                    continue;
                }
            };

            for action in forward_actions(pair, src, dest.as_ref(), self.options.recursive) {
                if !self.run_action(&action, entered) {
                    break;
                }
            }
        }
        true
    }

    fn reverse_pass(&mut self, pair: &DirectoryPair, entered: &mut HashSet<OsString>) {
        let listing = match list_directory(&pair.dest, Symlinks::Preserve) {
            Ok(listing) => listing,
            Err(error) => {
                self.report(error);
                return;
            }
        };
        for error in listing.errors {
            self.report(error);
        }

        for dest in &listing.entries {
            // An unreadable source counterpart must not look like an orphan.
            let src = match stat_entry(&pair.source_path(&dest.name), Symlinks::Follow) {
                Ok(src) => src,
                Err(error) => {
                    self.report(error);
                    continue;
                }
            };

            let action = reverse_action(pair, dest, src.as_ref(), self.options.recursive);
            self.run_action(&action, entered);
        }
    }

    fn run_action(&mut self, action: &SyncAction, entered: &mut HashSet<OsString>) -> bool {
        match action {
            SyncAction::Skip => true,
            SyncAction::RecurseInto(child) => {
                // The reverse pass would revisit what the forward pass already reconciled.
                let name = child.dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
                if entered.insert(name) {
                    self.sync_level(child);
                }
                true
            }
            _ => execute_action(
                action,
                self.options.threshold,
                &mut self.stats,
                self.on_event,
            ),
        }
    }

    fn report(&mut self, error: SyncError) {
        self.stats.errors += 1;
        emit_event(self.on_event, ExecutionEvent::EntryError { error });
    }
}
