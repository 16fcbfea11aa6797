use std::{fmt, mem, str::FromStr};

use crate::error::{Error, Result};

/// Interface identifier in the native 16-byte layout, passable wherever a `REFIID` is expected.
#[repr(C)]
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Guid
{
	pub data1 : u32,
	pub data2 : u16,
	pub data3 : u16,
	pub data4 : [u8; 8],
}

const _ : () = assert!(mem::size_of::<Guid>() == 16);
const _ : () = assert!(mem::align_of::<Guid>() == 4);

const GROUP_LENGTHS : [usize; 5] = [8, 4, 4, 4, 12];

impl Guid
{
	pub const fn from_values(data1 : u32, data2 : u16, data3 : u16, data4 : [u8; 8]) -> Self
	{
		Guid { data1, data2, data3, data4 }
	}

	/// Parses the canonical `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` form.
	pub fn parse(text : &str) -> Result<Self>
	{
		let malformed = || Error::MalformedIdentifier(text.to_owned());

		let groups : Vec<&str> = text.split('-').collect();
		if groups.len() != GROUP_LENGTHS.len()
		{
			return Err(malformed());
		}

		for (group, &length) in groups.iter().zip(GROUP_LENGTHS.iter())
		{
			if group.len() != length || !group.bytes().all(|b| b.is_ascii_hexdigit())
			{
				return Err(malformed());
			}
		}

		// Every group is now plain hex of a known width, so the radix parses cannot fail.
		let data1 = u32::from_str_radix(groups[0], 16).map_err(|_| malformed())?;
		let data2 = u16::from_str_radix(groups[1], 16).map_err(|_| malformed())?;
		let data3 = u16::from_str_radix(groups[2], 16).map_err(|_| malformed())?;

		let tail = [groups[3], groups[4]].concat();
		let mut data4 = [0_u8; 8];
		for (n, byte) in data4.iter_mut().enumerate()
		{
			*byte = u8::from_str_radix(&tail[n * 2..n * 2 + 2], 16).map_err(|_| malformed())?;
		}

		Ok(Guid { data1, data2, data3, data4 })
	}

	/// Native byte order: three little-endian fields followed by `data4` as written.
	pub fn to_bytes(&self) -> [u8; 16]
	{
		let mut bytes = [0_u8; 16];
		bytes[0..4].copy_from_slice(&self.data1.to_le_bytes());
		bytes[4..6].copy_from_slice(&self.data2.to_le_bytes());
		bytes[6..8].copy_from_slice(&self.data3.to_le_bytes());
		bytes[8..16].copy_from_slice(&self.data4);
		bytes
	}

	pub fn from_bytes(bytes : [u8; 16]) -> Self
	{
		let mut data4 = [0_u8; 8];
		data4.copy_from_slice(&bytes[8..16]);
		Guid
		{
			data1 : u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
			data2 : u16::from_le_bytes([bytes[4], bytes[5]]),
			data3 : u16::from_le_bytes([bytes[6], bytes[7]]),
			data4,
		}
	}
}

pub fn parse_identifier(text : &str) -> Result<Guid>
{
	Guid::parse(text)
}

/// Identifier of a built-in interface, written out in canonical form.
///
/// Panics on malformed text; only used for the constant tables of the wrapper modules.
pub(crate) fn interface_id(text : &'static str) -> Guid
{
	match Guid::parse(text)
	{
		Ok(guid) => guid,
		Err(err) => panic!("built-in {}", err),
	}
}

impl FromStr for Guid
{
	type Err = Error;

	fn from_str(text : &str) -> Result<Self>
	{
		Guid::parse(text)
	}
}

impl fmt::Display for Guid
{
	fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result
	{
		let d = &self.data4;
		write!(f, "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
			self.data1, self.data2, self.data3,
			d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7])
	}
}

impl fmt::Debug for Guid
{
	fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result
	{
		write!(f, "{{{}}}", self)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn parses_into_native_layout()
	{
		// ID3D11Texture2D
		let guid = Guid::parse("6f15aaf2-d208-4e89-9ab4-489535d34f9c").unwrap();
		assert_eq!(guid.data1, 0x6f15aaf2);
		assert_eq!(guid.data2, 0xd208);
		assert_eq!(guid.data3, 0x4e89);
		assert_eq!(guid.data4, [0x9a, 0xb4, 0x48, 0x95, 0x35, 0xd3, 0x4f, 0x9c]);
		assert_eq!(guid.to_bytes(), [
			0xf2, 0xaa, 0x15, 0x6f,
			0x08, 0xd2,
			0x89, 0x4e,
			0x9a, 0xb4, 0x48, 0x95, 0x35, 0xd3, 0x4f, 0x9c]);
	}

	#[test]
	fn accepts_upper_case_digits()
	{
		let lower = Guid::parse("189819f1-1db6-4b57-be54-1821339b85f7").unwrap();
		let upper = Guid::parse("189819F1-1DB6-4B57-BE54-1821339B85F7").unwrap();
		assert_eq!(lower, upper);
	}

	#[test]
	fn round_trips_through_text()
	{
		let samples : [[u8; 16]; 4] = [
			[0; 16],
			[0xff; 16],
			[0x02, 0xea, 0xc6, 0x1b, 0x36, 0xef, 0x4f, 0x46, 0xbf, 0x0c, 0x21, 0xca, 0x39, 0xe5, 0x16, 0x8a],
			[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16],
		];

		for bytes in samples.iter()
		{
			let text = Guid::from_bytes(*bytes).to_string();
			let parsed : Guid = text.parse().unwrap();
			assert_eq!(parsed.to_bytes(), *bytes, "{}", text);
		}
	}

	#[test]
	fn formats_canonically()
	{
		let guid = Guid::from_values(0x1bc6ea02, 0xef36, 0x464f, [0xbf, 0x0c, 0x21, 0xca, 0x39, 0xe5, 0x16, 0x8a]);
		assert_eq!(guid.to_string(), "1bc6ea02-ef36-464f-bf0c-21ca39e5168a");
		assert_eq!(format!("{:?}", guid), "{1bc6ea02-ef36-464f-bf0c-21ca39e5168a}");
	}

	#[test]
	fn rejects_malformed_text()
	{
		let bad = [
			"",
			"1bc6ea02-ef36-464f-bf0c",
			"1bc6ea02-ef36-464f-bf0c-21ca39e5168a-00",
			"1bc6ea02ef36-464f-bf0c-21ca39e5168a",
			"1bc6ea0-2ef36-464f-bf0c-21ca39e5168a",
			"1bc6ea02-ef36-464f-bf0c-21ca39e5168",
			"1bc6ea02-ef36-464f-bf0c-21ca39e5168a0",
			"1bc6ea0g-ef36-464f-bf0c-21ca39e5168a",
			"+bc6ea02-ef36-464f-bf0c-21ca39e5168a",
			"{1bc6ea02-ef36-464f-bf0c-21ca39e5168a}",
			"1bc6ea02-ef36-464f-bf0c-21ca39e5168\u{e9}",
		];

		for text in bad.iter()
		{
			match Guid::parse(text)
			{
				Err(Error::MalformedIdentifier(reported)) => assert_eq!(&reported, text),
				other => panic!("{:?} parsed as {:?}", text, other),
			}
		}
	}
}
