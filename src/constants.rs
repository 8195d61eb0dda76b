// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All magnitudes are AB magnitudes, all fluxes are in nJy and all times are TAI
MJDs unless stated otherwise.
 */

/// How far back in time \[days\] to look for previous pointings of a field.
pub const DEFAULT_LOOKBACK_DAYS: f64 = 365.0;

/// The default cone-search radius around a pointing centre \[degrees\].
pub const DEFAULT_CONE_RADIUS_DEG: f64 = 1.75;

/// The number of alerts that are accumulated before they're handed to a sink.
pub const DEFAULT_CHUNK_SIZE: usize = 3000;

/// The AB zero point expressed in nJy, i.e. a magnitude of 31.4 is 1 nJy.
pub const AB_ZERO_POINT_NJY: f64 = 31.4;

/// The time between the start of an exposure and its mid point \[seconds\].
/// 15 seconds for the first exposure, then 1 second each for shutter close
/// and open.
pub const MID_EXPOSURE_OFFSET_SECONDS: f64 = 17.0;

/// `diaSourceId = objectId * SOURCE_ID_VISIT_FACTOR + visitId`. Visit IDs must
/// be smaller than this.
pub const SOURCE_ID_VISIT_FACTOR: u64 = 10_000_000;

/// `ccdVisitId = visitId * CCD_VISIT_CHIP_FACTOR + chipNum`. Chip numbers must
/// be smaller than this.
pub const CCD_VISIT_CHIP_FACTOR: u64 = 10_000;

/// How long to wait for a TCP connection to be established \[seconds\].
pub const SOCKET_CONNECT_TIMEOUT_SECONDS: u64 = 5;

/// How long a multicast sender waits for responses \[seconds\].
pub const MULTICAST_RESPONSE_TIMEOUT_SECONDS: u64 = 1;

/// The largest acknowledgement or unframed message read from a socket.
pub const SOCKET_BUFFER_SIZE: usize = 10_000;

/// The largest message with a length header that is sent or accepted
/// \[bytes\].
pub const MAX_FRAMED_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// The largest UDP payload over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// The port alerts are sent to, and the port the receiver listens on.
pub const DEFAULT_PORT: u16 = 8098;

/// The host alerts are sent to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// The time-to-live of multicast datagrams.
pub const DEFAULT_MULTICAST_TTL: u32 = 1;

/// Where checkpoints are stored.
pub const DEFAULT_STATE_DIR: &str = "alertsim_state";
