//! Conversion of source members into the destination schema.
use std::str::FromStr;

use chrono::NaiveDate;
use member_common::model::{Address, CanonicalMember, SourceAddress, SourceMember};
use tracing::warn;

use crate::error::{MigrationError, NormalizationError};
use crate::report::FailedMember;

/// The only value of the source "has children" field that means yes.
pub const HAS_CHILDREN_TOKEN: &str = "Sim";

const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";
const ANNIVERSARY_FORMAT: &str = "%d/%m";

/// What to do with the rest of a batch when one member fails to normalize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnInvalidRecord {
    /// Abort the whole run on the first invalid member.
    #[default]
    Abort,
    /// Leave invalid members out of the migration and report them.
    Skip,
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownPolicyError(pub String);

impl FromStr for OnInvalidRecord {
    type Err = UnknownPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_ref() {
            "abort" => Ok(OnInvalidRecord::Abort),
            "skip" => Ok(OnInvalidRecord::Skip),
            invalid => Err(UnknownPolicyError(invalid.to_owned())),
        }
    }
}

/// Members ready for migration plus the ones left out under `OnInvalidRecord::Skip`.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub members: Vec<CanonicalMember>,
    pub rejected: Vec<FailedMember>,
}

/// Normalize a single source member. Pure: the same input always gives the same result.
pub fn normalize(member: SourceMember) -> Result<CanonicalMember, NormalizationError> {
    let name = normalize_name(&member.name)?;
    let birth_anniversary = birth_anniversary(&member.birth_date)?;
    let baptism_year = baptism_year(&member.baptism_year)?;

    Ok(CanonicalMember {
        name,
        birth_date: member.birth_date,
        baptism_year,
        sex: member.sex,
        marital_status: member.marital_status,
        wedding_date: member.wedding_date,
        spouse_name: member.spouse_name.unwrap_or_default(),
        has_children: member.has_children == HAS_CHILDREN_TOKEN,
        email: member.email,
        phone: member.phone,
        status: member.status,
        status_date: member.status_date,
        validated: member.validated,
        address: normalize_address(member.address),
        birth_anniversary,
    })
}

/// Normalize every member, preserving source order.
///
/// Under `OnInvalidRecord::Abort` the first failure is returned with the member's position.
pub fn normalize_all(
    members: Vec<SourceMember>,
    policy: OnInvalidRecord,
) -> Result<NormalizedBatch, MigrationError> {
    let mut batch = NormalizedBatch {
        members: Vec::with_capacity(members.len()),
        rejected: Vec::new(),
    };

    for (index, member) in members.into_iter().enumerate() {
        let source_name = member.name.clone();

        match normalize(member) {
            Ok(canonical) => batch.members.push(canonical),
            Err(error) => match policy {
                OnInvalidRecord::Abort => {
                    return Err(MigrationError::Normalization {
                        index,
                        name: source_name,
                        error,
                    })
                }
                OnInvalidRecord::Skip => {
                    warn!("skipping member #{} ('{}'): {}", index, source_name, error);
                    batch.rejected.push(FailedMember {
                        name: source_name,
                        reason: error.to_string(),
                    });
                }
            },
        }
    }

    Ok(batch)
}

fn normalize_name(name: &str) -> Result<String, NormalizationError> {
    if name.trim().is_empty() {
        return Err(NormalizationError::EmptyName);
    }
    Ok(name.chars().map(upper_case_char).collect())
}

/// Upper-case one character, keeping it as is when its upper case spans several characters
/// (`ß` stays `ß`). Names must upper-case the same way the existing destination rows did.
fn upper_case_char(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}

/// Project a `YYYY-MM-DD` birth date onto its `DD/MM` anniversary.
fn birth_anniversary(birth_date: &str) -> Result<String, NormalizationError> {
    let well_formed = birth_date.len() == 10
        && birth_date.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });

    if !well_formed {
        return Err(NormalizationError::DateFormat(birth_date.to_owned()));
    }

    NaiveDate::parse_from_str(birth_date, BIRTH_DATE_FORMAT)
        .map(|date| date.format(ANNIVERSARY_FORMAT).to_string())
        .map_err(|_| NormalizationError::DateFormat(birth_date.to_owned()))
}

fn baptism_year(year: &str) -> Result<i64, NormalizationError> {
    if year.is_empty() {
        return Ok(0);
    }
    year.parse::<i64>()
        .map_err(|_| NormalizationError::NumericFormat(year.to_owned()))
}

fn normalize_address(address: SourceAddress) -> Address {
    Address {
        cep: address.cep,
        rua: address.rua,
        numero: address.numero,
        bairro: address.bairro,
        complemento: address.complemento.unwrap_or_default(),
    }
}
