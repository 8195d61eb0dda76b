// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Simulate alerts for every pointing of a survey.
//!
//! Pointings are handled one at a time: query the catalog, assemble an alert
//! per object, hand the alerts to the dispatcher and drain it. A pointing
//! only counts as done once its alerts are delivered and the checkpoint has
//! been updated.


use std::{collections::HashSet, num::NonZeroUsize, path::PathBuf};

use indexmap::IndexMap;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info, trace, warn};
use thiserror::Error;

use crate::{
    alert::{assemble, AssembleError, AssembleOptions, HistoryMode},
    catalog::{CatalogSelection, ObjectQuery, QueryError},
    checkpoint::{Checkpoint, CheckpointError, CheckpointStore},
    cli::InfoPrinter,
    dispatch::{ChunkedDispatcher, DispatchError, DispatchSummary},
    io::sink::{AlertSink, SinkError, SinkParams},
    survey::{PointingSource, SurveyConstraint, SurveyError},
    PROGRESS_BARS,
};

/// Parameters needed to simulate alerts.
pub(crate) struct SimulateParams {
    /// Where the pointings come from.
    pub(crate) survey: Box<dyn PointingSource>,

    pub(crate) constraint: SurveyConstraint,

    /// How far back histories reach \[days\].
    pub(crate) lookback_days: f64,

    /// Where the objects come from.
    pub(crate) catalog: Box<dyn ObjectQuery>,

    pub(crate) selection: CatalogSelection,

    pub(crate) assemble: AssembleOptions,

    pub(crate) sink: SinkParams,

    /// How many alerts are handed to the sink at once.
    pub(crate) chunk_size: NonZeroUsize,

    /// The checkpoint token. Without one, nothing is persisted and every run
    /// starts from scratch.
    pub(crate) token: Option<String>,

    /// The directory of the checkpoint store.
    pub(crate) state_dir: PathBuf,
}

/// What happened during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SimulateSummary {
    pub(crate) num_pointings: usize,
    pub(crate) num_pointings_processed: usize,
    pub(crate) num_pointings_skipped: usize,
    pub(crate) num_alerts: usize,
    pub(crate) num_objects_malformed: usize,
    pub(crate) num_objects_already_issued: usize,
    pub(crate) alerts_per_field: IndexMap<u32, usize>,
    pub(crate) dispatch: DispatchSummary,
}

impl SimulateParams {
    pub(crate) fn run(&self) -> Result<SimulateSummary, SimulateError> {
        let store = match &self.token {
            Some(_) => Some(CheckpointStore::open(&self.state_dir)?),
            None => None,
        };
        let sink = self.sink.open()?;
        let summary = self.run_with(sink, store)?;

        let mut printer = InfoPrinter::new("Simulation summary".into());
        printer.push_block(vec![
            format!("Pointings: {}", summary.num_pointings).into(),
            format!("Processed: {}", summary.num_pointings_processed).into(),
            format!("Skipped (already delivered): {}", summary.num_pointings_skipped).into(),
        ]);
        printer.push_block(vec![
            format!(
                "Alerts: {} in {} batches",
                summary.num_alerts, summary.dispatch.num_flushes
            )
            .into(),
            format!("Fields with alerts: {}", summary.alerts_per_field.len()).into(),
        ]);
        if summary.num_objects_malformed > 0 || summary.num_objects_already_issued > 0 {
            printer.push_block(vec![
                format!(
                    "Objects with bad variability: {}",
                    summary.num_objects_malformed
                )
                .into(),
                format!(
                    "Objects already issued: {}",
                    summary.num_objects_already_issued
                )
                .into(),
            ]);
        }
        printer.display();

        Ok(summary)
    }

    /// Run the pipeline into an already-opened sink.
    pub(crate) fn run_with(
        &self,
        sink: Box<dyn AlertSink>,
        store: Option<CheckpointStore>,
    ) -> Result<SimulateSummary, SimulateError> {
        let full_history = self.assemble.history == HistoryMode::Full;

        let mut histories = self.survey.histories(&self.constraint, self.lookback_days)?;
        if full_history {
            // The newest pointing of a field carries its whole light curve.
            histories.reverse();
        }
        info!("{} pointings to simulate", histories.len());

        let checkpoint = match (&self.token, &store) {
            (Some(token), Some(store)) => {
                let c = store.load_or_new(token)?;
                if let Some(last) = c.last_obs_hist_id {
                    info!(
                        "Resuming '{token}' after visit {last} ({} completed fields)",
                        c.field_ids.len()
                    );
                }
                c
            }
            (Some(token), None) => Checkpoint::new(token.as_str()),
            (None, _) => Checkpoint::new(""),
        };
        // Pointings are skipped against the checkpoint as it was when the run
        // started; visit IDs increase with time, so everything up to the last
        // delivered visit was handled by an earlier run.
        let resume_from = checkpoint.clone();
        let mut dispatcher = ChunkedDispatcher::new(sink, self.chunk_size, checkpoint, store);

        let multi_progress = MultiProgress::with_draw_target(if PROGRESS_BARS.load() {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        });
        let pointing_progress = multi_progress.add(
            ProgressBar::new(histories.len() as _)
                .with_style(
                    ProgressStyle::default_bar()
                        .template("{msg:17}: [{wide_bar:.blue}] {pos:2}/{len:2} pointings ({elapsed_precise}<{eta_precise})").unwrap()
                        .progress_chars("=> "),
                )
                .with_position(0)
                .with_message("Pointings"),
        );
        let alert_progress = multi_progress.add(
            ProgressBar::new_spinner()
                .with_style(
                    ProgressStyle::default_spinner()
                        .template("{msg:17}: {pos} alerts ({elapsed_precise})")
                        .unwrap(),
                )
                .with_message("Alerts dispatched"),
        );

        let mut summary = SimulateSummary {
            num_pointings: histories.len(),
            ..Default::default()
        };
        let mut already_issued: HashSet<u64> = HashSet::new();

        for history in &histories {
            let current = history.current();
            let skip = if full_history {
                dispatcher.checkpoint().skip_field(history.field_id())
            } else {
                resume_from.skip_pointing(current.visit_id)
            };
            if skip {
                trace!(
                    "Skipping visit {} of field {}; already delivered",
                    current.visit_id,
                    current.field_id
                );
                summary.num_pointings_skipped += 1;
                pointing_progress.inc(1);
                continue;
            }

            let outcome = self.catalog.query(current, &self.selection)?;
            debug!(
                "Visit {} ({} band, field {}): {} objects, history of {}",
                current.visit_id,
                current.filter,
                current.field_id,
                outcome.objects.len(),
                history.len() - 1
            );
            for malformed in &outcome.malformed {
                warn!(
                    "Skipping object {} seen by visit {}: {}",
                    malformed.id, current.visit_id, malformed.reason
                );
            }
            summary.num_objects_malformed += outcome.malformed.len();

            for object in &outcome.objects {
                if full_history && already_issued.contains(&object.id) {
                    summary.num_objects_already_issued += 1;
                    continue;
                }
                let alert = assemble(object, history, self.assemble)?;
                dispatcher.push(alert)?;
                if full_history {
                    already_issued.insert(object.id);
                }
                summary.num_alerts += 1;
                *summary
                    .alerts_per_field
                    .entry(current.field_id)
                    .or_default() += 1;
                alert_progress.inc(1);
            }

            dispatcher.drain(
                current.visit_id,
                full_history.then_some(history.field_id()),
            )?;
            summary.num_pointings_processed += 1;
            pointing_progress.inc(1);
        }

        summary.dispatch = dispatcher.finish()?;
        pointing_progress.abandon_with_message("Finished pointings");
        alert_progress.abandon_with_message("Finished alerts");
        Ok(summary)
    }
}

#[derive(Error, Debug)]
pub(crate) enum SimulateError {
    #[error(transparent)]
    Survey(#[from] SurveyError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}
