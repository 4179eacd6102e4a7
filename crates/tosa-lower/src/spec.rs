use std::{
    collections::HashSet,
    fmt, fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Serialized program format version enforced on decode.
pub const SPEC_VERSION: &str = "tosa.v0.80";

fn default_spec_version() -> String {
    SPEC_VERSION.to_string()
}

/// Element types of target tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DType {
    Bool,
    Int4,
    Int8,
    Int16,
    Int32,
    Int48,
    Fp16,
    Bf16,
    Fp32,
}

/// Operator codes understood by the target runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TosaOp {
    Reshape,
}

impl TosaOp {
    pub fn as_str(self) -> &'static str {
        match self {
            TosaOp::Reshape => "RESHAPE",
        }
    }
}

impl fmt::Display for TosaOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute payload for `RESHAPE`.
///
/// `new_shape` is expressed in the target's physical axis order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReshapeAttribute {
    pub new_shape: Vec<usize>,
}

impl ReshapeAttribute {
    pub fn new(new_shape: impl Into<Vec<usize>>) -> Self {
        Self {
            new_shape: new_shape.into(),
        }
    }
}

/// Operator-specific attribute attached to an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Reshape(ReshapeAttribute),
}

/// Single operator record in a serialized program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: TosaOp,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub attribute: Attribute,
}

/// Ordered instruction stream consumed by the backend runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default = "default_spec_version")]
    pub spec_version: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    pub instructions: Vec<Instruction>,
}

/// Rejection raised by [`ProgramBuilder`] when a record is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("{role} name must not be empty")]
    EmptyName { role: &'static str },
    #[error("value '{name}' is already defined in the program")]
    DuplicateName { name: String },
}

/// On-disk encodings of a [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramFormat {
    /// Pretty-printed `serde_json`.
    Json,
    /// `bincode` 1.x with its default options.
    Bincode,
}

impl ProgramFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ProgramFormat::Json => "json",
            ProgramFormat::Bincode => "bincode",
        }
    }
}

impl fmt::Display for ProgramFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ProgramSerdeError {
    #[error("malformed program json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed program bincode: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("program targets '{found}' but this lowering emits '{}'", SPEC_VERSION)]
    SpecVersionMismatch { found: String },
}

#[derive(Debug, Error)]
pub enum ProgramIoError {
    #[error("cannot access program file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("program file {} is not valid {format}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        format: ProgramFormat,
        #[source]
        source: ProgramSerdeError,
    },
    #[error(transparent)]
    Encode(#[from] ProgramSerdeError),
}

impl Program {
    pub fn new() -> Self {
        Self {
            spec_version: SPEC_VERSION.to_string(),
            inputs: Vec::new(),
            instructions: Vec::new(),
        }
    }

    pub fn encode(&self, format: ProgramFormat) -> Result<Vec<u8>, ProgramSerdeError> {
        let bytes = match format {
            ProgramFormat::Json => serde_json::to_vec_pretty(self)?,
            ProgramFormat::Bincode => bincode::serialize(self)?,
        };
        Ok(bytes)
    }

    /// Decodes a program, accepting only [`SPEC_VERSION`]. A missing or empty
    /// version is taken to be the current one.
    pub fn decode(bytes: &[u8], format: ProgramFormat) -> Result<Self, ProgramSerdeError> {
        let mut program: Program = match format {
            ProgramFormat::Json => serde_json::from_slice(bytes)?,
            ProgramFormat::Bincode => bincode::deserialize(bytes)?,
        };
        if program.spec_version.is_empty() {
            program.spec_version = default_spec_version();
        } else if program.spec_version != SPEC_VERSION {
            return Err(ProgramSerdeError::SpecVersionMismatch {
                found: program.spec_version,
            });
        }
        Ok(program)
    }

    pub fn save<P: AsRef<Path>>(
        &self,
        path: P,
        format: ProgramFormat,
    ) -> Result<(), ProgramIoError> {
        let path = path.as_ref();
        let bytes = self.encode(format)?;
        fs::write(path, bytes).map_err(|source| ProgramIoError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P, format: ProgramFormat) -> Result<Self, ProgramIoError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| ProgramIoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Program::decode(&bytes, format).map_err(|source| ProgramIoError::Decode {
            path: path.to_path_buf(),
            format,
            source,
        })
    }

    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

const INDENT: &str = "  ";

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "program (spec_version = {}) {{", self.spec_version)?;
        if !self.inputs.is_empty() {
            writeln!(f, "{INDENT}inputs:")?;
            for name in &self.inputs {
                writeln!(f, "{INDENT}{INDENT}%{name}")?;
            }
        }
        if !self.instructions.is_empty() {
            writeln!(f, "{INDENT}body:")?;
            for instruction in &self.instructions {
                writeln!(f, "{INDENT}{INDENT}{instruction}")?;
            }
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {}({}) {}",
            value_list(&self.outputs),
            self.op,
            value_list(&self.inputs),
            self.attribute
        )
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Reshape(attr) => {
                let dims: Vec<String> = attr.new_shape.iter().map(usize::to_string).collect();
                write!(f, "new_shape[{}]", dims.join(", "))
            }
        }
    }
}

fn value_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("%{name}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Append-only builder for serialized programs.
///
/// Every value name may be defined once, either as a declared program input or
/// as an instruction output. Records are validated before they are appended, so
/// a rejected call leaves the builder untouched.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    inputs: Vec<String>,
    instructions: Vec<Instruction>,
    defined: HashSet<String>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a graph placeholder that instructions may consume.
    pub fn declare_input(&mut self, name: impl Into<String>) -> Result<(), ProgramError> {
        let name = name.into();
        ensure_non_empty(&name, "input")?;
        if !self.defined.insert(name.clone()) {
            return Err(ProgramError::DuplicateName { name });
        }
        self.inputs.push(name);
        Ok(())
    }

    pub fn add_instruction(
        &mut self,
        op: TosaOp,
        inputs: Vec<String>,
        outputs: Vec<String>,
        attribute: Attribute,
    ) -> Result<(), ProgramError> {
        for name in &inputs {
            ensure_non_empty(name, "input")?;
        }
        let mut fresh = HashSet::with_capacity(outputs.len());
        for name in &outputs {
            ensure_non_empty(name, "output")?;
            if self.defined.contains(name) || !fresh.insert(name.as_str()) {
                return Err(ProgramError::DuplicateName { name: name.clone() });
            }
        }
        self.defined.extend(outputs.iter().cloned());
        self.instructions.push(Instruction {
            op,
            inputs,
            outputs,
            attribute,
        });
        Ok(())
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    pub fn finish(self) -> Program {
        Program {
            spec_version: SPEC_VERSION.to_string(),
            inputs: self.inputs,
            instructions: self.instructions,
        }
    }
}

fn ensure_non_empty(name: &str, role: &'static str) -> Result<(), ProgramError> {
    if name.is_empty() {
        Err(ProgramError::EmptyName { role })
    } else {
        Ok(())
    }
}
