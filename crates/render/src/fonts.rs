use std::collections::BTreeMap;

use bytes::Bytes;

/// Font binaries supplied to a single render, keyed by family and weight.
///
/// The bytes are shared handles on whatever the font cache holds, cloning a set never copies a
/// font. Family names are matched exactly, the way the rasterizer matches them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontSet {
	faces: BTreeMap<String, BTreeMap<u16, Bytes>>,
}

impl FontSet {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Every weight of a single family, the shape a font cache hands back
	pub fn from_family(
		family: impl Into<String>,
		weights: impl IntoIterator<Item = (u16, Bytes)>,
	) -> Self {
		let mut set = Self::new();
		let family = family.into();
		for (weight, data) in weights {
			set.insert(family.clone(), weight, data);
		}
		set
	}

	pub fn insert(&mut self, family: impl Into<String>, weight: u16, data: Bytes) -> Option<Bytes> {
		self.faces
			.entry(family.into())
			.or_default()
			.insert(weight, data)
	}

	#[must_use]
	pub fn with(mut self, family: impl Into<String>, weight: u16, data: Bytes) -> Self {
		self.insert(family, weight, data);
		self
	}

	#[must_use]
	pub fn get(&self, family: &str, weight: u16) -> Option<&Bytes> {
		self.faces.get(family).and_then(|weights| weights.get(&weight))
	}

	#[must_use]
	pub fn contains(&self, family: &str, weight: u16) -> bool {
		self.get(family, weight).is_some()
	}

	/// Family used for text that never declares one
	#[must_use]
	pub fn default_family(&self) -> Option<&str> {
		self.faces.keys().next().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, u16, &Bytes)> + '_ {
		self.faces.iter().flat_map(|(family, weights)| {
			weights
				.iter()
				.map(move |(weight, data)| (family.as_str(), *weight, data))
		})
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.faces.values().map(BTreeMap::len).sum()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
