//! Minimal JVM class-file reader
//!
//! Reads only the structural metadata the linter needs: the binary name,
//! direct supertype, implemented interfaces, method names with arities, and
//! the string constants of the constant pool. Bytecode is never interpreted
//! and user code never runs.

use crate::error::ProclintError;
use crate::result::Result;

const MAGIC: u32 = 0xCAFE_BABE;

/// Structural metadata of one compiled class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    /// Fully-qualified name in source form (`com.example.Foo`)
    pub name: String,
    /// Direct supertype; `None` for `java.lang.Object` itself
    pub super_name: Option<String>,
    /// Directly implemented interfaces
    pub interfaces: Vec<String>,
    /// Declared methods with parameter counts
    pub methods: Vec<MethodSig>,
    /// String constants of the constant pool, in pool order
    pub string_constants: Vec<String>,
}

/// A method name together with its parameter count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub name: String,
    pub arity: usize,
}

impl ClassFile {
    /// The simple (unqualified) class name
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Whether the binary name contains a nested-class separator
    pub fn is_nested(&self) -> bool {
        self.simple_name().contains('$')
    }

    /// Whether a method with the given name and arity is declared
    pub fn has_method(&self, name: &str, arity: usize) -> bool {
        self.methods.iter().any(|m| m.name == name && m.arity == arity)
    }
}

#[derive(Debug, Clone)]
enum PoolEntry {
    Utf8(String),
    Class(u16),
    StringRef(u16),
    Other,
    /// Second slot of a long/double entry
    Unusable,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    file: &'a str,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], file: &'a str) -> Self {
        Self { bytes, pos: 0, file }
    }

    fn err(&self, message: &str) -> ProclintError {
        ProclintError::parse_error(self.file, format!("{message} at offset {}", self.pos))
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| self.err("truncated class file"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }
}

/// Parse the structural metadata of a class file
pub fn parse_class(bytes: &[u8], file: &str) -> Result<ClassFile> {
    let mut r = Reader::new(bytes, file);
    if r.u32()? != MAGIC {
        return Err(r.err("bad magic number"));
    }
    r.skip(4)?; // minor + major version

    let pool_count = r.u16()? as usize;
    let mut pool: Vec<PoolEntry> = Vec::with_capacity(pool_count);
    pool.push(PoolEntry::Unusable); // index 0 is unused
    while pool.len() < pool_count {
        let tag = r.u8()?;
        let entry = match tag {
            1 => {
                let len = r.u16()? as usize;
                let raw = r.take(len)?;
                // Modified UTF-8; class and method names are plain ASCII in
                // practice, fall back lossily otherwise.
                PoolEntry::Utf8(String::from_utf8_lossy(raw).into_owned())
            }
            3 | 4 => {
                r.skip(4)?;
                PoolEntry::Other
            }
            5 | 6 => {
                // Longs and doubles occupy two constant pool slots
                r.skip(8)?;
                pool.push(PoolEntry::Other);
                PoolEntry::Unusable
            }
            7 => PoolEntry::Class(r.u16()?),
            8 => PoolEntry::StringRef(r.u16()?),
            9 | 10 | 11 | 12 | 17 | 18 => {
                r.skip(4)?;
                PoolEntry::Other
            }
            15 => {
                r.skip(3)?;
                PoolEntry::Other
            }
            16 | 19 | 20 => {
                r.skip(2)?;
                PoolEntry::Other
            }
            other => return Err(r.err(&format!("unknown constant pool tag {other}"))),
        };
        pool.push(entry);
    }

    let utf8 = |idx: u16| -> Result<String> {
        match pool.get(idx as usize) {
            Some(PoolEntry::Utf8(s)) => Ok(s.clone()),
            _ => Err(ProclintError::parse_error(
                file,
                format!("constant pool index {idx} is not utf8"),
            )),
        }
    };
    let class_name = |idx: u16| -> Result<Option<String>> {
        if idx == 0 {
            return Ok(None);
        }
        match pool.get(idx as usize) {
            Some(PoolEntry::Class(name_idx)) => Ok(Some(utf8(*name_idx)?.replace('/', "."))),
            _ => Err(ProclintError::parse_error(
                file,
                format!("constant pool index {idx} is not a class"),
            )),
        }
    };

    r.skip(2)?; // access flags
    let this_class = r.u16()?;
    let super_class = r.u16()?;
    let name = class_name(this_class)?
        .ok_or_else(|| ProclintError::parse_error(file, "missing this_class entry"))?;
    let super_name = class_name(super_class)?;

    let iface_count = r.u16()? as usize;
    let mut interfaces = Vec::with_capacity(iface_count);
    for _ in 0..iface_count {
        let idx = r.u16()?;
        if let Some(iface) = class_name(idx)? {
            interfaces.push(iface);
        }
    }

    // Fields: skipped entirely, only their attribute payloads are walked
    let field_count = r.u16()? as usize;
    for _ in 0..field_count {
        r.skip(6)?;
        skip_attributes(&mut r)?;
    }

    let method_count = r.u16()? as usize;
    let mut methods = Vec::with_capacity(method_count);
    for _ in 0..method_count {
        r.skip(2)?; // access flags
        let name_idx = r.u16()?;
        let desc_idx = r.u16()?;
        skip_attributes(&mut r)?;
        let method_name = utf8(name_idx)?;
        let descriptor = utf8(desc_idx)?;
        methods.push(MethodSig {
            name: method_name,
            arity: descriptor_arity(&descriptor)
                .ok_or_else(|| ProclintError::parse_error(file, "malformed method descriptor"))?,
        });
    }

    let string_constants = pool
        .iter()
        .filter_map(|entry| match entry {
            PoolEntry::StringRef(idx) => match pool.get(*idx as usize) {
                Some(PoolEntry::Utf8(s)) => Some(s.clone()),
                _ => None,
            },
            _ => None,
        })
        .collect();

    Ok(ClassFile {
        name,
        super_name,
        interfaces,
        methods,
        string_constants,
    })
}

fn skip_attributes(r: &mut Reader<'_>) -> Result<()> {
    let count = r.u16()? as usize;
    for _ in 0..count {
        r.skip(2)?;
        let len = r.u32()? as usize;
        r.skip(len)?;
    }
    Ok(())
}

/// Number of parameters encoded in a JVM method descriptor
fn descriptor_arity(descriptor: &str) -> Option<usize> {
    let inner = descriptor.strip_prefix('(')?;
    let params = &inner[..inner.find(')')?];
    let mut arity = 0;
    let mut chars = params.chars();
    while let Some(c) = chars.next() {
        match c {
            'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' => arity += 1,
            '[' => continue,
            'L' => {
                arity += 1;
                for c in chars.by_ref() {
                    if c == ';' {
                        break;
                    }
                }
            }
            _ => return None,
        }
    }
    Some(arity)
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    //! Builder for synthetic class files used in tests

    fn push_utf8(pool: &mut Vec<Vec<u8>>, text: &str) -> u16 {
        let mut entry = vec![1u8];
        entry.extend((text.len() as u16).to_be_bytes());
        entry.extend(text.as_bytes());
        pool.push(entry);
        pool.len() as u16
    }

    fn push_class(pool: &mut Vec<Vec<u8>>, name: &str) -> u16 {
        let internal = name.replace('.', "/");
        let name_idx = push_utf8(pool, &internal);
        let mut entry = vec![7u8];
        entry.extend(name_idx.to_be_bytes());
        pool.push(entry);
        pool.len() as u16
    }

    /// Assemble a minimal, valid class file
    pub fn class_bytes(
        name: &str,
        super_name: &str,
        interfaces: &[&str],
        methods: &[(&str, &str)],
        strings: &[&str],
    ) -> Vec<u8> {
        let mut pool: Vec<Vec<u8>> = Vec::new();

        let this_idx = push_class(&mut pool, name);
        let super_idx = push_class(&mut pool, super_name);
        let iface_indices: Vec<u16> = interfaces
            .iter()
            .map(|iface| push_class(&mut pool, iface))
            .collect();
        let method_indices: Vec<(u16, u16)> = methods
            .iter()
            .map(|&(method_name, descriptor)| {
                (
                    push_utf8(&mut pool, method_name),
                    push_utf8(&mut pool, descriptor),
                )
            })
            .collect();
        for text in strings.iter().copied() {
            let utf8_idx = push_utf8(&mut pool, text);
            let mut entry = vec![8u8];
            entry.extend(utf8_idx.to_be_bytes());
            pool.push(entry);
        }

        let mut bytes: Vec<u8> = Vec::new();
        bytes.extend(0xCAFE_BABEu32.to_be_bytes());
        bytes.extend(0u16.to_be_bytes()); // minor
        bytes.extend(52u16.to_be_bytes()); // major (Java 8)
        bytes.extend(((pool.len() + 1) as u16).to_be_bytes());
        for entry in &pool {
            bytes.extend(entry);
        }
        bytes.extend(0x0021u16.to_be_bytes()); // public super
        bytes.extend(this_idx.to_be_bytes());
        bytes.extend(super_idx.to_be_bytes());
        bytes.extend((iface_indices.len() as u16).to_be_bytes());
        for idx in &iface_indices {
            bytes.extend(idx.to_be_bytes());
        }
        bytes.extend(0u16.to_be_bytes()); // fields
        bytes.extend((method_indices.len() as u16).to_be_bytes());
        for (name_idx, desc_idx) in &method_indices {
            bytes.extend(0x0001u16.to_be_bytes());
            bytes.extend(name_idx.to_be_bytes());
            bytes.extend(desc_idx.to_be_bytes());
            bytes.extend(0u16.to_be_bytes()); // attributes
        }
        bytes.extend(0u16.to_be_bytes()); // class attributes
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::class_bytes;
    use super::*;

    #[test]
    fn parses_names_interfaces_and_methods() {
        let bytes = class_bytes(
            "com.example.PingProcessPluginDefinition",
            "java.lang.Object",
            &["dev.dsf.bpe.v1.ProcessPluginDefinition"],
            &[
                ("<init>", "()V"),
                ("getName", "()Ljava/lang/String;"),
                ("getProcessModels", "()Ljava/util/List;"),
            ],
            &["bpe/ping.bpmn", "fhir/Task/task-ping.xml"],
        );
        let class = parse_class(&bytes, "PingProcessPluginDefinition.class").unwrap();
        assert_eq!(class.name, "com.example.PingProcessPluginDefinition");
        assert_eq!(class.super_name.as_deref(), Some("java.lang.Object"));
        assert_eq!(
            class.interfaces,
            vec!["dev.dsf.bpe.v1.ProcessPluginDefinition"]
        );
        assert!(class.has_method("getName", 0));
        assert!(!class.has_method("getName", 1));
        assert_eq!(
            class.string_constants,
            vec!["bpe/ping.bpmn", "fhir/Task/task-ping.xml"]
        );
        assert_eq!(class.simple_name(), "PingProcessPluginDefinition");
        assert!(!class.is_nested());
    }

    #[test]
    fn rejects_bad_magic() {
        let err = parse_class(&[0, 1, 2, 3, 4, 5, 6, 7], "bad.class").unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn rejects_truncated_input() {
        let mut bytes = class_bytes("a.B", "java.lang.Object", &[], &[], &[]);
        bytes.truncate(bytes.len() / 2);
        assert!(parse_class(&bytes, "b.class").is_err());
    }

    #[test]
    fn descriptor_arity_counts_parameters() {
        assert_eq!(descriptor_arity("()V"), Some(0));
        assert_eq!(descriptor_arity("(II)V"), Some(2));
        assert_eq!(descriptor_arity("(Ljava/lang/String;[IJ)Z"), Some(3));
        assert_eq!(descriptor_arity("([[Ljava/lang/String;)V"), Some(1));
        assert_eq!(descriptor_arity("no-parens"), None);
    }

    #[test]
    fn nested_class_detection() {
        let bytes = class_bytes("a.Outer$Inner", "java.lang.Object", &[], &[], &[]);
        let class = parse_class(&bytes, "Outer$Inner.class").unwrap();
        assert!(class.is_nested());
    }
}
