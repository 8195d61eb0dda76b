// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Simulate alerts for the pointings of a survey and send them to a sink.

#[cfg(test)]
mod tests;

use std::{num::NonZeroUsize, path::PathBuf, str::FromStr};

use clap::Parser;
use itertools::Itertools;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::common::{
    display_warnings, InfoPrinter, Warn, ARG_FILE_HELP, PORT_HELP, STATE_DIR_HELP,
};
use crate::{
    alert::{AssembleOptions, HistoryMode, HISTORY_MODES_COMMA_SEPARATED},
    catalog::{Catalog, CatalogSelection},
    constants::{
        DEFAULT_CHUNK_SIZE, DEFAULT_CONE_RADIUS_DEG, DEFAULT_HOST, DEFAULT_LOOKBACK_DAYS,
        DEFAULT_MULTICAST_TTL, DEFAULT_PORT, DEFAULT_STATE_DIR,
    },
    io::{
        read::TABLE_FILE_TYPES_COMMA_SEPARATED,
        sink::{resolve_addr, SinkParams, SinkType, SINK_TYPES_COMMA_SEPARATED},
        write::{PayloadFormat, PAYLOAD_FORMATS_COMMA_SEPARATED},
    },
    params::SimulateParams,
    photometry::{Band, BANDS_COMMA_SEPARATED},
    survey::{NumberOrRange, SurveyConstraint, SurveyTable},
    AlertsimError,
};

lazy_static::lazy_static! {
    static ref SURVEY_HELP: String =
        format!("Path to the survey database (an opsim summary table). Supported formats: {}", *TABLE_FILE_TYPES_COMMA_SEPARATED);

    static ref FILTER_HELP: String =
        format!("Only simulate pointings taken with this filter. Valid filters: {}", *BANDS_COMMA_SEPARATED);

    static ref LOOKBACK_HELP: String =
        format!("How far back in time previous pointings of a field are included in an alert's history [days]. Default: {DEFAULT_LOOKBACK_DAYS}");

    static ref CATALOG_HELP: String =
        format!("Path to the object catalog. Supported formats: {}", *TABLE_FILE_TYPES_COMMA_SEPARATED);

    static ref RADIUS_HELP: String =
        format!("The cone-search radius around each pointing centre [degrees]. Default: {DEFAULT_CONE_RADIUS_DEG}");

    static ref HISTORY_HELP: String =
        format!("How much history each alert carries. Valid modes: {}. Default: {}", *HISTORY_MODES_COMMA_SEPARATED, HistoryMode::default());

    static ref SINK_HELP: String =
        format!("Where alerts are sent. Valid sinks: {}. Default: {}", *SINK_TYPES_COMMA_SEPARATED, SinkType::Tcp);

    static ref HOST_HELP: String =
        format!("The host (or multicast group) that network sinks send to. Default: {DEFAULT_HOST}");

    static ref PAYLOAD_HELP: String =
        format!("How each alert is encoded by network sinks. Valid formats: {}. Default: {}", *PAYLOAD_FORMATS_COMMA_SEPARATED, PayloadFormat::default());

    static ref TTL_HELP: String =
        format!("The time-to-live of multicast datagrams. Default: {DEFAULT_MULTICAST_TTL}");

    static ref CHUNK_SIZE_HELP: String =
        format!("The number of alerts handed to the sink at once. Default: {DEFAULT_CHUNK_SIZE}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct SurveyArgs {
    #[clap(short, long, help = SURVEY_HELP.as_str(), help_heading = "SURVEY")]
    pub(super) survey: Option<PathBuf>,

    /// Only simulate pointings from this night, or an inclusive range of
    /// nights (e.g. 100,200).
    #[clap(long, help_heading = "SURVEY")]
    pub(super) night: Option<String>,

    #[clap(long, help = FILTER_HELP.as_str(), help_heading = "SURVEY")]
    pub(super) filter: Option<String>,

    /// Only simulate pointings taken at this MJD, or within an inclusive MJD
    /// range (e.g. 59580,59590).
    #[clap(long, help_heading = "SURVEY")]
    pub(super) mjd: Option<String>,

    #[clap(long, help = LOOKBACK_HELP.as_str(), help_heading = "SURVEY")]
    pub(super) lookback: Option<f64>,
}

impl SurveyArgs {
    fn merge(self, other: Self) -> Self {
        Self {
            survey: self.survey.or(other.survey),
            night: self.night.or(other.night),
            filter: self.filter.or(other.filter),
            mjd: self.mjd.or(other.mjd),
            lookback: self.lookback.or(other.lookback),
        }
    }
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct CatalogArgs {
    #[clap(short, long, help = CATALOG_HELP.as_str(), help_heading = "CATALOG")]
    pub(super) catalog: Option<PathBuf>,

    #[clap(short, long, help = RADIUS_HELP.as_str(), help_heading = "CATALOG")]
    pub(super) radius: Option<f64>,

    /// Also make alerts for objects without a light-curve model.
    #[clap(long, help_heading = "CATALOG")]
    #[serde(default)]
    pub(super) all_objects: bool,

    /// Only use objects at least this bright in a band, e.g. "r=24". May be
    /// given more than once.
    #[clap(long, multiple_occurrences(true), help_heading = "CATALOG")]
    pub(super) mag_limit: Option<Vec<String>>,
}

impl CatalogArgs {
    fn merge(self, other: Self) -> Self {
        Self {
            catalog: self.catalog.or(other.catalog),
            radius: self.radius.or(other.radius),
            all_objects: self.all_objects || other.all_objects,
            mag_limit: self.mag_limit.or(other.mag_limit),
        }
    }
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct AlertArgs {
    #[clap(long, help = HISTORY_HELP.as_str(), help_heading = "ALERTS")]
    pub(super) history: Option<String>,

    /// Don't add flux errors, SNR and total fluxes to DIA sources.
    #[clap(long, help_heading = "ALERTS")]
    #[serde(default)]
    pub(super) no_dia: bool,
}

impl AlertArgs {
    fn merge(self, other: Self) -> Self {
        Self {
            history: self.history.or(other.history),
            no_dia: self.no_dia || other.no_dia,
        }
    }
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct OutputArgs {
    #[clap(long, help = SINK_HELP.as_str(), help_heading = "OUTPUT")]
    pub(super) sink: Option<String>,

    #[clap(long, help = HOST_HELP.as_str(), help_heading = "OUTPUT")]
    pub(super) host: Option<String>,

    #[clap(short, long, help = PORT_HELP.as_str(), help_heading = "OUTPUT")]
    pub(super) port: Option<u16>,

    /// Don't put a 4-byte big-endian length in front of every TCP message.
    /// Unframed messages must fit into one read by the receiver.
    #[clap(long, help_heading = "OUTPUT")]
    #[serde(default)]
    pub(super) no_header: bool,

    #[clap(long, help = PAYLOAD_HELP.as_str(), help_heading = "OUTPUT")]
    pub(super) payload: Option<String>,

    #[clap(long, help = TTL_HELP.as_str(), help_heading = "OUTPUT")]
    pub(super) ttl: Option<u32>,

    /// The output directory of the json and avro sinks, or the database
    /// directory of the docstore sink.
    #[clap(short, long, help_heading = "OUTPUT")]
    pub(super) output: Option<PathBuf>,

    #[clap(long, help = CHUNK_SIZE_HELP.as_str(), help_heading = "OUTPUT")]
    pub(super) chunk_size: Option<usize>,

    /// Name this run so that it can be resumed. Pointings already delivered
    /// under the same token are skipped.
    #[clap(long, help_heading = "CHECKPOINTS")]
    pub(super) token: Option<String>,

    #[clap(long, help = STATE_DIR_HELP.as_str(), help_heading = "CHECKPOINTS")]
    pub(super) state_dir: Option<PathBuf>,
}

impl OutputArgs {
    fn merge(self, other: Self) -> Self {
        Self {
            sink: self.sink.or(other.sink),
            host: self.host.or(other.host),
            port: self.port.or(other.port),
            no_header: self.no_header || other.no_header,
            payload: self.payload.or(other.payload),
            ttl: self.ttl.or(other.ttl),
            output: self.output.or(other.output),
            chunk_size: self.chunk_size.or(other.chunk_size),
            token: self.token.or(other.token),
            state_dir: self.state_dir.or(other.state_dir),
        }
    }
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct SimulateArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "survey")]
    #[serde(default)]
    pub(super) survey_args: SurveyArgs,

    #[clap(flatten)]
    #[serde(rename = "catalog")]
    #[serde(default)]
    pub(super) catalog_args: CatalogArgs,

    #[clap(flatten)]
    #[serde(rename = "alerts")]
    #[serde(default)]
    pub(super) alert_args: AlertArgs,

    #[clap(flatten)]
    #[serde(rename = "output")]
    #[serde(default)]
    pub(super) output_args: OutputArgs,
}

impl SimulateArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<SimulateArgs, AlertsimError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Read in the file arguments. Ensure all of the file args are
            // accounted for by pattern matching.
            let SimulateArgs {
                args_file: _,
                survey_args,
                catalog_args,
                alert_args,
                output_args,
            } = unpack_arg_file!(arg_file);

            Ok(SimulateArgs {
                args_file: None,
                survey_args: cli_args.survey_args.merge(survey_args),
                catalog_args: cli_args.catalog_args.merge(catalog_args),
                alert_args: cli_args.alert_args.merge(alert_args),
                output_args: cli_args.output_args.merge(output_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<SimulateParams, AlertsimError> {
        debug!("{:#?}", self);

        // Expose all the struct fields to ensure they're all used.
        let SimulateArgs {
            args_file: _,
            survey_args:
                SurveyArgs {
                    survey,
                    night,
                    filter,
                    mjd,
                    lookback,
                },
            catalog_args:
                CatalogArgs {
                    catalog,
                    radius,
                    all_objects,
                    mag_limit,
                },
            alert_args: AlertArgs { history, no_dia },
            output_args:
                OutputArgs {
                    sink,
                    host,
                    port,
                    no_header,
                    payload,
                    ttl,
                    output,
                    chunk_size,
                    token,
                    state_dir,
                },
        } = self;

        // The survey and its constraints.
        let survey_file = survey.ok_or(SimulateArgsError::NoSurvey)?;
        let constraint = SurveyConstraint {
            night: night.as_deref().map(NumberOrRange::from_str).transpose()?,
            filter: filter.as_deref().map(parse_band).transpose()?,
            mjd: mjd.as_deref().map(NumberOrRange::from_str).transpose()?,
        };
        let lookback_days = lookback.unwrap_or(DEFAULT_LOOKBACK_DAYS);
        if !lookback_days.is_finite() || lookback_days < 0.0 {
            return Err(SimulateArgsError::BadLookback(lookback_days).into());
        }
        let survey = SurveyTable::from_file(&survey_file)?;

        let num_matching = survey
            .pointings()
            .iter()
            .filter(|p| constraint.matches(p))
            .count();
        let mut printer = InfoPrinter::new("Survey".into());
        printer.push_line(format!("Reading pointings from {}", survey_file.display()).into());
        let mut block = vec![format!(
            "{} pointings, {num_matching} to simulate",
            survey.pointings().len()
        )
        .into()];
        if let Some(night) = night {
            block.push(format!("Night(s): {night}").into());
        }
        if let Some(band) = constraint.filter {
            block.push(format!("Filter: {band}").into());
        }
        if let Some(mjd) = mjd {
            block.push(format!("MJD(s): {mjd}").into());
        }
        printer.push_block(block);
        printer.push_line(format!("Histories reach back {lookback_days} days").into());
        printer.display();
        if num_matching == 0 {
            "No pointings match the survey constraints; nothing will be simulated".warn();
        }

        // The catalog.
        let catalog_file = catalog.ok_or(SimulateArgsError::NoCatalog)?;
        let radius_deg = radius.unwrap_or(DEFAULT_CONE_RADIUS_DEG);
        let catalog = Catalog::from_file(&catalog_file, radius_deg)?;
        let mag_limits = mag_limit
            .unwrap_or_default()
            .iter()
            .map(|s| parse_mag_limit(s))
            .collect::<Result<Vec<_>, _>>()?;
        let selection = CatalogSelection {
            variable_only: !all_objects,
            mag_limits,
        };

        let mut printer = InfoPrinter::new("Catalog".into());
        printer.push_line(format!("Reading objects from {}", catalog_file.display()).into());
        let mut block = vec![
            format!("{} objects", catalog.len()).into(),
            format!("Cone-search radius: {radius_deg}°").into(),
        ];
        if selection.variable_only {
            block.push("Only variable objects".into());
        }
        if !selection.mag_limits.is_empty() {
            block.push(
                format!(
                    "Magnitude limits: {}",
                    selection
                        .mag_limits
                        .iter()
                        .map(|(band, mag)| format!("{band} <= {mag}"))
                        .join(", ")
                )
                .into(),
            );
        }
        printer.push_block(block);
        printer.display();
        if catalog.is_empty() {
            "The catalog has no objects; no alerts will be made".warn();
        }

        // Alert contents.
        let history = match history {
            None => HistoryMode::default(),
            Some(h) => HistoryMode::from_str(&h.to_lowercase())
                .map_err(|_| SimulateArgsError::BadHistoryMode(h))?,
        };
        let assemble = AssembleOptions {
            history,
            full_dia: !no_dia,
        };

        // Where alerts go.
        let sink_type = match sink {
            None => SinkType::Tcp,
            Some(s) => {
                SinkType::from_str(&s.to_lowercase()).map_err(|_| SimulateArgsError::BadSinkType(s))?
            }
        };
        let format = match &payload {
            None => PayloadFormat::default(),
            Some(f) => PayloadFormat::from_str(&f.to_lowercase())
                .map_err(|_| SimulateArgsError::BadPayloadFormat(f.clone()))?,
        };
        let chunk_size = NonZeroUsize::new(chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE))
            .ok_or(SimulateArgsError::ZeroChunkSize)?;
        if token.as_deref() == Some("") {
            return Err(SimulateArgsError::EmptyToken.into());
        }
        let state_dir = state_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));

        if sink_type.is_network() {
            if output.is_some() {
                format!("--output is ignored by the {sink_type} sink").warn();
            }
        } else if host.is_some() || port.is_some() || payload.is_some() {
            format!("Network options (--host/--port/--payload) are ignored by the {sink_type} sink")
                .warn();
        }
        if no_header && sink_type != SinkType::Tcp {
            format!("--no-header is ignored by the {sink_type} sink").warn();
        }
        let header = !no_header;
        if ttl.is_some() && sink_type != SinkType::Multicast {
            format!("--ttl is ignored by the {sink_type} sink").warn();
        }

        let addr = || resolve_addr(host.as_deref().unwrap_or(DEFAULT_HOST), port.unwrap_or(DEFAULT_PORT));
        let output_path = || output.clone().ok_or(SimulateArgsError::NoOutput(sink_type));
        let sink = match sink_type {
            SinkType::Tcp => SinkParams::Tcp {
                addr: addr()?,
                header,
                format,
            },
            SinkType::Multicast => {
                let addr = addr()?;
                if !addr.ip().is_multicast() {
                    format!("{} isn't a multicast address", addr.ip()).warn();
                }
                SinkParams::Multicast {
                    addr,
                    ttl: ttl.unwrap_or(DEFAULT_MULTICAST_TTL),
                    format,
                }
            }
            SinkType::Unicast => SinkParams::Unicast {
                addr: addr()?,
                format,
            },
            SinkType::Json => SinkParams::JsonFiles { dir: output_path()? },
            SinkType::Avro => SinkParams::AvroFiles { dir: output_path()? },
            SinkType::DocStore => SinkParams::DocStore {
                path: output_path()?,
            },
        };

        let mut printer = InfoPrinter::new("Alerts".into());
        printer.push_block(vec![
            format!("History: {history}").into(),
            if assemble.full_dia {
                "With full DIA source attributes".into()
            } else {
                "Without flux errors, SNR or total fluxes".into()
            },
        ]);
        let mut block = vec![format!("Sending to {} ({sink_type})", sink.destination()).into()];
        if sink_type.is_network() {
            block.push(format!("Payload: {format}").into());
        }
        if sink_type == SinkType::Tcp {
            block.push(if header {
                "Messages have a length header".into()
            } else {
                "Messages have no length header".into()
            });
        }
        block.push(format!("Batches of up to {chunk_size} alerts").into());
        printer.push_block(block);
        match &token {
            Some(token) => printer.push_line(
                format!("Checkpointing as '{token}' in {}", state_dir.display()).into(),
            ),
            None => printer.push_line("No checkpoint token; the run can't be resumed".into()),
        }
        printer.display();

        display_warnings();

        Ok(SimulateParams {
            survey: Box::new(survey),
            constraint,
            lookback_days,
            catalog: Box::new(catalog),
            selection,
            assemble,
            sink,
            chunk_size,
            token,
            state_dir,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), AlertsimError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        Ok(())
    }
}

fn parse_band(s: &str) -> Result<Band, SimulateArgsError> {
    Band::from_str(&s.trim().to_lowercase()).map_err(|_| SimulateArgsError::BadFilter(s.to_string()))
}

/// Parse "band=mag", e.g. "r=24.5".
fn parse_mag_limit(s: &str) -> Result<(Band, f64), SimulateArgsError> {
    let bad = || SimulateArgsError::BadMagLimit(s.to_string());
    let (band, mag) = s.split_once('=').ok_or_else(bad)?;
    let band = parse_band(band).map_err(|_| bad())?;
    let mag: f64 = mag.trim().parse().map_err(|_| bad())?;
    if !mag.is_finite() {
        return Err(bad());
    }
    Ok((band, mag))
}

#[derive(Error, Debug)]
pub(super) enum SimulateArgsError {
    #[error("No survey database was supplied")]
    NoSurvey,

    #[error("No object catalog was supplied")]
    NoCatalog,

    #[error("'{0}' isn't a filter; valid filters are: {}", *BANDS_COMMA_SEPARATED)]
    BadFilter(String),

    #[error("The lookback window must be a non-negative number of days, but got {0}")]
    BadLookback(f64),

    #[error("Couldn't parse magnitude limit '{0}'; expected something like 'r=24.5'")]
    BadMagLimit(String),

    #[error("'{0}' isn't a history mode; valid modes are: {}", *HISTORY_MODES_COMMA_SEPARATED)]
    BadHistoryMode(String),

    #[error("'{0}' isn't a sink; valid sinks are: {}", *SINK_TYPES_COMMA_SEPARATED)]
    BadSinkType(String),

    #[error("'{0}' isn't a payload format; valid formats are: {}", *PAYLOAD_FORMATS_COMMA_SEPARATED)]
    BadPayloadFormat(String),

    #[error("The {0} sink needs somewhere to write (--output)")]
    NoOutput(SinkType),

    #[error("The chunk size cannot be 0")]
    ZeroChunkSize,

    #[error("The checkpoint token cannot be empty")]
    EmptyToken,
}
