/// A CBOR value tree, serialized with definite-length headers only.
///
/// This covers the produce side of the crate; decoding goes through a
/// cursor over the received bytes instead of building a tree.
#[derive(Clone, Debug)]
pub enum Cbor {
    Uint(u64),
    Nint(u64),
    Bstr(Vec<u8>),
    Tstr(String),
    Array(Vec<Cbor>),
    Map(Vec<(Cbor, Cbor)>),
    Tag(u64, Box<Cbor>),
    True,
    False,
    Null,
    /// An already-encoded item, spliced into the output verbatim.
    /// The caller is responsible for the bytes forming one complete item.
    Raw(Vec<u8>),
}

impl Cbor {
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Cbor::Uint(number) => write_header(out, 0, *number),
            Cbor::Nint(number) => {
                if *number == 0 {
                    write_header(out, 0, *number)
                } else {
                    write_header(out, 1, *number - 1)
                }
            }
            Cbor::Bstr(bytes) => {
                write_header(out, 2, bytes.len() as u64);
                out.extend_from_slice(bytes);
            }
            Cbor::Tstr(string) => {
                write_header(out, 3, string.len() as u64);
                out.extend_from_slice(string.as_bytes());
            }
            Cbor::Array(elements) => {
                write_header(out, 4, elements.len() as u64);
                for element in elements {
                    element.write(out);
                }
            }
            Cbor::Map(elements) => {
                write_header(out, 5, elements.len() as u64);
                for (key, value) in elements {
                    key.write(out);
                    value.write(out);
                }
            }
            Cbor::Tag(number, tagged_element) => {
                write_header(out, 6, *number);
                tagged_element.write(out);
            }
            Cbor::True => write_header(out, 7, 21),
            Cbor::False => write_header(out, 7, 20),
            Cbor::Null => write_header(out, 7, 22),
            Cbor::Raw(bytes) => out.extend_from_slice(bytes),
        }
    }
}

impl From<Vec<u8>> for Cbor {
    fn from(bytes: Vec<u8>) -> Cbor {
        Cbor::Bstr(bytes)
    }
}

impl From<&[u8]> for Cbor {
    fn from(bytes: &[u8]) -> Cbor {
        Cbor::Bstr(bytes.to_vec())
    }
}

impl From<String> for Cbor {
    fn from(text: String) -> Cbor {
        Cbor::Tstr(text)
    }
}

impl From<&str> for Cbor {
    fn from(text: &str) -> Cbor {
        Cbor::Tstr(text.to_string())
    }
}

impl From<u64> for Cbor {
    fn from(number: u64) -> Cbor {
        Cbor::Uint(number)
    }
}

impl From<u32> for Cbor {
    fn from(number: u32) -> Cbor {
        Cbor::Uint(number as u64)
    }
}

impl From<bool> for Cbor {
    fn from(boolean: bool) -> Cbor {
        if boolean {
            Cbor::True
        } else {
            Cbor::False
        }
    }
}

fn write_header(out: &mut Vec<u8>, major_type: u8, argument: u64) {
    if argument < 24 {
        out.push(major_type << 5 | argument as u8);
        return;
    }

    let bytes = argument.to_be_bytes();

    let used = 8 - bytes.iter().position(|&byte| byte != 0).unwrap();

    let (argument_in, argument_extended) = match used {
        1 => (24, &bytes[7..8]),
        2 => (25, &bytes[6..8]),
        3 | 4 => (26, &bytes[4..8]),
        _ => (27, &bytes[..]),
    };

    out.push(major_type << 5 | argument_in);
    out.extend_from_slice(argument_extended);
}
