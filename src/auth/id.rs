//! Strongly typed identifiers for enterprises and remote configuration records.

// std
use std::borrow::Borrow;
// self
use crate::_prelude::*;

/// Hyphenated UUID of an enterprise customer, stored in lowercase.
///
/// The portal routes and the Canvas `state` parameter both carry this value verbatim, so it is
/// checked against the `8-4-4-4-12` hex layout before it can reach a URL.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnterpriseId(String);
impl EnterpriseId {
	const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

	/// Parses and normalizes an enterprise UUID.
	pub fn new(value: impl AsRef<str>) -> Result<Self, EnterpriseIdError> {
		let value = value.as_ref();

		if value.is_empty() {
			return Err(EnterpriseIdError::Empty);
		}

		let mut groups = value.split('-');
		let well_formed = Self::GROUPS.iter().all(|&len| {
			groups.next().is_some_and(|group| {
				group.len() == len && group.bytes().all(|b| b.is_ascii_hexdigit())
			})
		}) && groups.next().is_none();

		if !well_formed {
			return Err(EnterpriseIdError::Malformed { value: value.to_owned() });
		}

		Ok(Self(value.to_ascii_lowercase()))
	}
}
impl Deref for EnterpriseId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for EnterpriseId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for EnterpriseId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<EnterpriseId> for String {
	fn from(value: EnterpriseId) -> Self {
		value.0
	}
}
impl TryFrom<String> for EnterpriseId {
	type Error = EnterpriseIdError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl FromStr for EnterpriseId {
	type Err = EnterpriseIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for EnterpriseId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Enterprise({})", self.0)
	}
}
impl Display for EnterpriseId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Error returned when an enterprise identifier is not a hyphenated UUID.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum EnterpriseIdError {
	/// The identifier was empty.
	#[error("Enterprise identifier cannot be empty.")]
	Empty,
	/// The identifier does not follow the hyphenated UUID layout.
	#[error("Enterprise identifier {value:?} is not a hyphenated UUID.")]
	Malformed {
		/// Rejected input.
		value: String,
	},
}

/// Numeric identifier of a remote LMS configuration record.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigId(pub u64);
impl Debug for ConfigId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Config({})", self.0)
	}
}
impl Display for ConfigId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0, f)
	}
}
impl From<u64> for ConfigId {
	fn from(value: u64) -> Self {
		Self(value)
	}
}
