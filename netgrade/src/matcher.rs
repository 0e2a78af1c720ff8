//! Align submitted files with master devices.
//!
//! A submission is matched to a master device by the hostname configured in
//! it first, and by its file name second. File names are compared after the
//! student's identity prefix has been stripped, so `212.05_R1.txt` matches
//! master `R1`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::identity::IdentityHint;

/// Hostnames a device reports before anyone configures it.
const DEFAULT_HOSTNAMES: &[&str] = &["router", "switch"];

/// Anything that can tell the matcher which device it is.
pub trait DeviceIdentity {
    fn hostname(&self) -> Option<&str>;
}

/// A master device and the submission that was matched to it.
#[derive(Debug)]
pub struct DevicePair<'a, M, S> {
    /// Master identifier; results are reported under this name.
    pub device: &'a str,
    pub student_id: &'a str,
    pub master: &'a M,
    pub student: &'a S,
}

/// Ambiguity found while matching. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchNote {
    pub device: String,
    pub kept: String,
    pub ignored: String,
}

impl Display for MatchNote {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "device {} submitted twice; {} ignored ({} kept)",
            self.device, self.ignored, self.kept
        )
    }
}

#[derive(Debug)]
pub struct MatchOutcome<'a, M, S> {
    /// In master identifier order.
    pub pairs: Vec<DevicePair<'a, M, S>>,
    /// Master devices with no submission.
    pub missing: Vec<&'a str>,
    /// Submissions matching no master device.
    pub extra: Vec<&'a str>,
    pub notes: Vec<MatchNote>,
}

/// Pair every submission with at most one master device.
///
/// Both maps are walked in identifier order, so when two files claim the
/// same device the first one wins and the other is reported as extra with a
/// note. Hostnames shared by several master devices, or left at a factory
/// default, are not used for matching.
pub fn match_devices<'a, M, S>(
    master: &'a BTreeMap<String, M>,
    student: &'a BTreeMap<String, S>,
    hint: &IdentityHint,
) -> MatchOutcome<'a, M, S>
where
    M: DeviceIdentity,
    S: DeviceIdentity,
{
    let mut host_counts: BTreeMap<String, usize> = BTreeMap::new();
    for device in master.values() {
        if let Some(host) = device.hostname().and_then(usable_hostname) {
            *host_counts.entry(host).or_default() += 1;
        }
    }
    let by_hostname: BTreeMap<String, &str> = master
        .iter()
        .filter_map(|(id, device)| {
            let host = device.hostname().and_then(usable_hostname)?;
            (host_counts.get(&host) == Some(&1)).then(|| (host, id.as_str()))
        })
        .collect();

    // master id -> student id
    let mut taken: BTreeMap<&str, &str> = BTreeMap::new();
    let mut assigned: BTreeSet<&str> = BTreeSet::new();
    let mut notes = Vec::new();
    // student id -> master id it lost in the hostname pass
    let mut displaced: BTreeMap<&str, &str> = BTreeMap::new();

    for (sid, device) in student {
        let Some(host) = device.hostname().and_then(usable_hostname) else {
            continue;
        };
        let Some(&mid) = by_hostname.get(&host) else {
            continue;
        };
        if taken.contains_key(mid) {
            displaced.insert(sid.as_str(), mid);
        } else {
            taken.insert(mid, sid.as_str());
            assigned.insert(sid.as_str());
        }
    }

    for sid in student.keys() {
        if assigned.contains(sid.as_str()) {
            continue;
        }
        let base = hint.strip_from(sid).trim();
        let by_name = master
            .keys()
            .find(|mid| mid.eq_ignore_ascii_case(base))
            .map(String::as_str);
        match by_name {
            Some(mid) if !taken.contains_key(mid) => {
                taken.insert(mid, sid.as_str());
                assigned.insert(sid.as_str());
            }
            Some(mid) => notes.push(MatchNote {
                device: mid.to_string(),
                kept: taken.get(mid).map(|s| s.to_string()).unwrap_or_default(),
                ignored: sid.clone(),
            }),
            None => {
                if let Some(mid) = displaced.get(sid.as_str()) {
                    notes.push(MatchNote {
                        device: mid.to_string(),
                        kept: taken.get(mid).map(|s| s.to_string()).unwrap_or_default(),
                        ignored: sid.clone(),
                    });
                }
            }
        }
    }

    let mut pairs = Vec::new();
    let mut missing = Vec::new();
    for (mid, device) in master {
        match taken.get(mid.as_str()).and_then(|sid| student.get_key_value(*sid)) {
            Some((sid, submitted)) => pairs.push(DevicePair {
                device: mid.as_str(),
                student_id: sid.as_str(),
                master: device,
                student: submitted,
            }),
            None => missing.push(mid.as_str()),
        }
    }
    let extra = student
        .keys()
        .map(String::as_str)
        .filter(|sid| !assigned.contains(sid))
        .collect();

    MatchOutcome {
        pairs,
        missing,
        extra,
        notes,
    }
}

fn usable_hostname(host: &str) -> Option<String> {
    let host = host.trim().to_ascii_lowercase();
    if host.is_empty() || DEFAULT_HOSTNAMES.contains(&host.as_str()) {
        None
    } else {
        Some(host)
    }
}
