// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writing alerts as VOEvent 2.0 XML.

use std::io::Write;

use hifitime::Epoch;

use crate::alert::{AlertBundle, DiaSource};

pub(crate) const IVORN_PREFIX: &str = "ivo://alertsim/stream";
const AUTHOR_IVORN: &str = "ivo://alertsim";

/// Escape text for use in XML attributes and elements.
pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// An ISO-8601 TAI time with millisecond precision.
pub(crate) fn iso_time_tai(mjd_tai: f64) -> String {
    let (y, mo, d, h, mi, s, ns) = Epoch::from_mjd_tai(mjd_tai).to_gregorian_tai();
    format!(
        "{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}.{:03}",
        ns / 1_000_000
    )
}

fn write_param<T: Write>(
    buf: &mut T,
    name: &str,
    data_type: &str,
    value: &str,
) -> std::io::Result<()> {
    writeln!(
        buf,
        r#"      <Param name="{}" dataType="{}" value="{}"/>"#,
        escape(name),
        data_type,
        escape(value)
    )
}

fn write_group<T: Write>(buf: &mut T, name: &str, source: &DiaSource) -> std::io::Result<()> {
    writeln!(buf, r#"    <Group name="{name}">"#)?;
    write_param(buf, "diaSourceId", "long", &source.dia_source_id.to_string())?;
    write_param(buf, "ccdVisitId", "long", &source.ccd_visit_id.to_string())?;
    write_param(buf, "diaObjectId", "long", &source.dia_object_id.to_string())?;
    write_param(buf, "midPointTai", "double", &source.mid_point_tai.to_string())?;
    write_param(buf, "filterName", "string", &source.filter_name.to_string())?;
    write_param(buf, "ra", "double", &source.ra.to_string())?;
    write_param(buf, "decl", "double", &source.decl.to_string())?;
    write_param(buf, "mag", "double", &source.mag.to_string())?;
    write_param(buf, "apFlux", "double", &source.ap_flux.to_string())?;
    for (name, value) in [
        ("apFluxErr", source.ap_flux_err),
        ("snr", source.snr),
        ("totFlux", source.tot_flux),
        ("totFluxErr", source.tot_flux_err),
    ] {
        if let Some(v) = value {
            write_param(buf, name, "double", &v.to_string())?;
        }
    }
    writeln!(buf, "    </Group>")
}

/// Write one alert as a VOEvent document. The current source is the
/// "DIASourceCurrent" group, followed by a "DIASourceHistory" group per
/// previous source, newest first.
pub(crate) fn write_voevent<T: Write>(buf: &mut T, alert: &AlertBundle) -> std::io::Result<()> {
    let current = &alert.dia_source;
    let time = iso_time_tai(current.mid_point_tai);

    writeln!(buf, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        buf,
        r#"<voe:VOEvent xmlns:voe="http://www.ivoa.net/xml/VOEvent/v2.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.ivoa.net/xml/VOEvent/v2.0 http://www.ivoa.net/xml/VOEvent/VOEvent-v2.0.xsd" version="2.0" role="test" ivorn="{IVORN_PREFIX}#{}">"#,
        alert.alert_id
    )?;

    writeln!(buf, "  <Who>")?;
    writeln!(buf, "    <AuthorIVORN>{AUTHOR_IVORN}</AuthorIVORN>")?;
    writeln!(buf, "    <Date>{time}</Date>")?;
    writeln!(buf, "    <Author>")?;
    writeln!(buf, "      <shortName>alertsim</shortName>")?;
    writeln!(buf, "    </Author>")?;
    writeln!(buf, "  </Who>")?;

    writeln!(buf, "  <What>")?;
    write_group(buf, "DIASourceCurrent", current)?;
    for prv in &alert.prv_dia_sources {
        write_group(buf, "DIASourceHistory", prv)?;
    }
    writeln!(buf, "  </What>")?;

    writeln!(buf, "  <WhereWhen>")?;
    writeln!(buf, "    <ObsDataLocation>")?;
    writeln!(buf, r#"      <ObservatoryLocation id="GEOLUN"/>"#)?;
    writeln!(buf, "      <ObservationLocation>")?;
    writeln!(buf, r#"        <AstroCoordSystem id="TAI-ICRS-TOPO"/>"#)?;
    writeln!(buf, r#"        <AstroCoords coord_system_id="TAI-ICRS-TOPO">"#)?;
    writeln!(
        buf,
        "          <Time><TimeInstant><ISOTime>{time}</ISOTime></TimeInstant></Time>"
    )?;
    writeln!(buf, r#"          <Position2D unit="deg">"#)?;
    writeln!(buf, "            <Name1>RA</Name1>")?;
    writeln!(buf, "            <Name2>Dec</Name2>")?;
    writeln!(
        buf,
        "            <Value2><C1>{}</C1><C2>{}</C2></Value2>",
        current.ra, current.decl
    )?;
    writeln!(buf, "          </Position2D>")?;
    writeln!(buf, "        </AstroCoords>")?;
    writeln!(buf, "      </ObservationLocation>")?;
    writeln!(buf, "    </ObsDataLocation>")?;
    writeln!(buf, "  </WhereWhen>")?;

    writeln!(buf, "  <How>")?;
    writeln!(buf, "    <Description>Simulated difference-image alert</Description>")?;
    writeln!(buf, "  </How>")?;
    writeln!(buf, "</voe:VOEvent>")?;

    Ok(())
}
