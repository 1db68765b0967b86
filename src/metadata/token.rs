use std::fmt;
use std::hash::{Hash, Hasher};

/// `TypeDef` table identifier (high byte of a token)
pub const TABLE_TYPEDEF: u8 = 0x02;
/// `MethodDef` table identifier (high byte of a token)
pub const TABLE_METHODDEF: u8 = 0x06;
/// `MemberRef` table identifier (high byte of a token)
pub const TABLE_MEMBERREF: u8 = 0x0A;
/// `MethodSpec` table identifier (high byte of a token)
pub const TABLE_METHODSPEC: u8 = 0x2B;

/// A metadata token representing a reference to a metadata table entry.
///
/// Tokens in .NET metadata consist of a 32-bit value where:
/// - The high byte (bits 24-31) indicates the table type
/// - The low 24 bits (bits 0-23) indicate the row index within that table
///
/// A token is only unique within the module that assigned it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token(pub u32);

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token from a table identifier and a 1-based row
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the token points into the `TypeDef` table
    #[must_use]
    pub fn is_type_def(&self) -> bool {
        self.table() == TABLE_TYPEDEF
    }

    /// Returns true if the token points into the `MethodDef` table
    #[must_use]
    pub fn is_method_def(&self) -> bool {
        self.table() == TABLE_METHODDEF
    }

    /// Returns true if the token points into the `MemberRef` table
    #[must_use]
    pub fn is_member_ref(&self) -> bool {
        self.table() == TABLE_MEMBERREF
    }

    /// Returns true if the token points into the `MethodSpec` table
    #[must_use]
    pub fn is_method_spec(&self) -> bool {
        self.table() == TABLE_METHODSPEC
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}
