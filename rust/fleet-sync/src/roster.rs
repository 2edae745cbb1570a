/*
 * Copyright 2025 Carver Automation Corporation.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Parsing the externally supplied vehicle roster.
//!
//! Each line is `serial,external_id,vin,name,group|group|...`. Fields are
//! not quoted, so a line with any other number of commas is malformed.

pub const FIELD_COUNT: usize = 5;
pub const GROUP_SEPARATOR: char = '|';

const SERIAL_LEN: usize = 12;
const SERIAL_PREFIX: char = 'G';

/// One requested device state from the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterUpdate {
    pub serial: String,
    pub external_id: String,
    pub vin: String,
    pub name: String,
    pub groups: Vec<String>,
}

impl RosterUpdate {
    /// The name the device should carry; the serial when the roster leaves it blank.
    pub fn desired_name(&self) -> &str {
        if self.name.is_empty() {
            &self.serial
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterParse {
    pub updates: Vec<RosterUpdate>,
    pub malformed: usize,
    pub header_skipped: bool,
}

/// Whether a field looks like a device serial number, e.g. `G9A1B2C3D4E5`.
pub fn looks_like_serial(field: &str) -> bool {
    field.len() == SERIAL_LEN
        && field.starts_with(SERIAL_PREFIX)
        && field.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn parse_roster(content: &str) -> RosterParse {
    let mut parsed = RosterParse::default();
    let mut first = true;

    for (index, line) in content.lines().enumerate() {
        let line = line.trim_start_matches('\u{feff}').trim();
        if line.is_empty() {
            continue;
        }
        if std::mem::take(&mut first) {
            let leading = line.split(',').next().unwrap_or_default().trim();
            if !looks_like_serial(leading) {
                tracing::debug!(line = index + 1, "skipping roster header");
                parsed.header_skipped = true;
                continue;
            }
        }
        match parse_line(line) {
            Some(update) => parsed.updates.push(update),
            None => {
                tracing::warn!(
                    line = index + 1,
                    fields = line.split(',').count(),
                    expected = FIELD_COUNT,
                    "malformed roster line"
                );
                parsed.malformed += 1;
            }
        }
    }

    tracing::info!(
        updates = parsed.updates.len(),
        malformed = parsed.malformed,
        "roster parsed"
    );
    parsed
}

fn parse_line(line: &str) -> Option<RosterUpdate> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [serial, external_id, vin, name, groups] = fields.as_slice() else {
        return None;
    };
    Some(RosterUpdate {
        serial: serial.to_string(),
        external_id: external_id.to_string(),
        vin: vin.to_string(),
        name: name.to_string(),
        groups: groups
            .split(GROUP_SEPARATOR)
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serial_pattern() {
        assert!(looks_like_serial("G9A1B2C3D4E5"));
        assert!(!looks_like_serial("Serial"));
        assert!(!looks_like_serial("H9A1B2C3D4E5"));
        assert!(!looks_like_serial("G9A1B2C3D4E"));
        assert!(!looks_like_serial("G9A1B2C3-4E5"));
    }

    #[test]
    fn parses_rows_and_skips_header() {
        let content = "Serial,Id,VIN,Name,Groups\r\n\
                       G9A1B2C3D4E5, 1001 ,1FTFW1E50JFA00001,Truck 12, b27A | b27B |\r\n\
                       G9A1B2C3D4E6,1002,1FTFW1E50JFA00002,,\r\n";
        let parsed = parse_roster(content);
        assert!(parsed.header_skipped);
        assert_eq!(parsed.malformed, 0);
        assert_eq!(
            parsed.updates,
            vec![
                RosterUpdate {
                    serial: "G9A1B2C3D4E5".into(),
                    external_id: "1001".into(),
                    vin: "1FTFW1E50JFA00001".into(),
                    name: "Truck 12".into(),
                    groups: vec!["b27A".into(), "b27B".into()],
                },
                RosterUpdate {
                    serial: "G9A1B2C3D4E6".into(),
                    external_id: "1002".into(),
                    vin: "1FTFW1E50JFA00002".into(),
                    name: String::new(),
                    groups: Vec::new(),
                },
            ]
        );
        assert_eq!(parsed.updates[1].desired_name(), "G9A1B2C3D4E6");
    }

    #[test]
    fn headerless_file_keeps_first_row() {
        let parsed = parse_roster("G9A1B2C3D4E5,1,VIN1,Van,b1\n");
        assert!(!parsed.header_skipped);
        assert_eq!(parsed.updates.len(), 1);
    }

    #[test]
    fn malformed_rows_are_counted() {
        let content = "G9A1B2C3D4E5,1,VIN1,Van,b1\n\
                       G9A1B2C3D4E6,2,VIN2\n\
                       \n\
                       G9A1B2C3D4E7,3,VIN3,Van, 3,b1|b2\n\
                       G9A1B2C3D4E8,4,VIN4,Car,b2\n";
        let parsed = parse_roster(content);
        assert_eq!(parsed.malformed, 2);
        let serials: Vec<_> = parsed.updates.iter().map(|u| u.serial.as_str()).collect();
        assert_eq!(serials, ["G9A1B2C3D4E5", "G9A1B2C3D4E8"]);
    }

    #[test]
    fn empty_roster() {
        assert_eq!(parse_roster(""), RosterParse::default());
        assert_eq!(parse_roster("\n\n"), RosterParse::default());
    }
}
