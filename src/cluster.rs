//! The `cluster` subcommand: stream abnormal alignments chromosome by
//! chromosome out of the store, run DBSCAN over each chromosome's
//! alignments, and write the resulting labels back as `clustering` rows.

use std::ops::ControlFlow;

use clap::Parser;
use tracing::{debug, info};

use crate::common;
use crate::dbscan::Dbscan;
use crate::err::AppError;
use crate::store::Store;

/// `cluster` subcommand arguments.
#[derive(Debug, Parser)]
pub struct Args {
    /// Path to the SQLite database holding `alignment`/`clustering`.
    #[clap(long)]
    pub path_db: String,

    /// Maximum distance between a point and its neighbors to still count
    /// them as part of its neighborhood.
    #[clap(long, default_value = "1000")]
    pub eps: i64,

    /// Minimum neighborhood size (including the point itself) for a point to
    /// seed a cluster.
    #[clap(long, default_value = "3")]
    pub min_pts: i32,
}

/// Run one clustering pass over every abnormal alignment in `store`,
/// batching one [`Dbscan`] instance per chromosome (the cursor is ordered by
/// chromosome, so a change in chromosome marks a complete batch) and writing
/// one `clustering` row per labeled point. Returns the total number of
/// clusters found across all chromosomes.
///
/// `cancelled` is polled between rows and between chromosome passes; once it
/// returns `true` the cursor stops reading further rows and returns cleanly
/// without running a final pass on the chromosome in flight.
pub fn run_clustering(
    store: &Store,
    eps: i64,
    min_pts: i32,
    mut cancelled: impl FnMut() -> bool,
) -> Result<usize, AppError> {
    assert!(min_pts >= 3, "min_pts must be at least 3");

    info!("Clustering abnormal alignments");

    let mut dbscan: Dbscan<i64> = Dbscan::new();
    let mut chr_prev: Option<String> = None;
    let mut cluster_base = 0usize;

    let flush = |dbscan: &mut Dbscan<i64>,
                 chr: &str,
                 cluster_base: &mut usize|
     -> Result<(), AppError> {
        debug!("Clustering at '{chr}'");
        let found = dbscan.cluster(eps, min_pts, |p| {
            store.insert_clustering(
                (*cluster_base as i64) + p.id() as i64,
                *p.data(),
                p.label() as i32,
                p.neighbors(),
            )
        })?;
        debug!("Found {found} clusters at {chr}");
        *cluster_base += found;
        Ok(())
    };

    let mut stopped_early = false;
    store.for_each_abnormal_alignment(|row| {
        if cancelled() {
            stopped_early = true;
            return Ok(ControlFlow::Break(()));
        }

        if chr_prev.as_deref() != Some(row.chr.as_str()) {
            if let Some(chr) = chr_prev.take() {
                flush(&mut dbscan, &chr, &mut cluster_base)?;
                dbscan = Dbscan::new();
            }
            chr_prev = Some(row.chr.clone());
        }

        dbscan.insert_point(row.low, row.high, row.id);
        Ok(ControlFlow::Continue(()))
    })?;

    if !stopped_early {
        if let Some(chr) = chr_prev {
            flush(&mut dbscan, &chr, &mut cluster_base)?;
        }
    }

    info!("Found {cluster_base} clusters");
    Ok(cluster_base)
}

/// Entry point for the `cluster` subcommand, matching this codebase's
/// `run(&common::Args, &Args)` convention for leaf subcommands.
pub fn run(_common: &common::Args, args: &Args) -> Result<(), AppError> {
    common::trace_rss_now();
    let store = Store::open(&args.path_db)?;
    run_clustering(&store, args.eps, args.min_pts, || false)?;
    common::trace_rss_now();
    Ok(())
}
