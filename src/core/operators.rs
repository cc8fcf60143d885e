//! Static table of recognized C++ operators.
//!
//! Every overloaded operator the generator knows how to wrap is listed in
//! [`OPERATORS`]. A method named `operatorX` is matched against the table by
//! token and argument count; the first entry that matches wins.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How the shim invokes an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorCategory {
    /// The shim reuses the native token: `*(thiz_cast) == *(c2_cast)`.
    DirectCall,
    /// The shim calls the operator as a method: `thiz_cast->operator[](i)`.
    NamedCall,
    /// The left side is mutated in place and the C function returns void.
    Assignment,
}

/// Argument count an operator is matched with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    Unary,
    Binary,
}

impl Arity {
    pub fn arg_count(self) -> usize {
        match self {
            Arity::Unary => 0,
            Arity::Binary => 1,
        }
    }
}

/// How an operator surfaces in the Kotlin bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KotlinOperatorStyle {
    /// `operator fun minus(...)`
    OperatorSugar(&'static str),
    /// `infix fun eq(...)`
    Infix(&'static str),
    /// Plain method whose C call passes a dummy `0` to select the postfix form.
    DummyArgument(&'static str),
    /// Ordinary method.
    Plain(&'static str),
}

impl KotlinOperatorStyle {
    /// Kotlin-side method name.
    pub fn name(self) -> &'static str {
        match self {
            KotlinOperatorStyle::OperatorSugar(n)
            | KotlinOperatorStyle::Infix(n)
            | KotlinOperatorStyle::DummyArgument(n)
            | KotlinOperatorStyle::Plain(n) => n,
        }
    }
}

/// A recognized operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Minus,
    Plus,
    Times,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    BinaryAnd,
    BinaryOr,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Index,
    PostIncrement,
    PostDecrement,
    Increment,
    Decrement,
    UnaryMinus,
    UnaryPlus,
    Not,
    Inv,
    Reference,
    PointerReference,
    Assign,
    PlusEquals,
}

/// Every operator in match order: binaries, unaries, then assignments.
pub const OPERATORS: &[Operator] = &[
    Operator::Minus,
    Operator::Plus,
    Operator::Times,
    Operator::Div,
    Operator::Mod,
    Operator::Eq,
    Operator::Neq,
    Operator::Lt,
    Operator::Gt,
    Operator::LtEq,
    Operator::GtEq,
    Operator::BinaryAnd,
    Operator::BinaryOr,
    Operator::And,
    Operator::Or,
    Operator::Xor,
    Operator::Shl,
    Operator::Shr,
    Operator::Index,
    Operator::PostIncrement,
    Operator::PostDecrement,
    Operator::Increment,
    Operator::Decrement,
    Operator::UnaryMinus,
    Operator::UnaryPlus,
    Operator::Not,
    Operator::Inv,
    Operator::Reference,
    Operator::PointerReference,
    Operator::Assign,
    Operator::PlusEquals,
];

/// Kotlin method names that infix operators occupy.
pub const INFIX_NAMES: &[&str] = &[
    "assign",
    "plusEquals",
    "eq",
    "neq",
    "lt",
    "gt",
    "lteq",
    "gteq",
    "binAnd",
    "binOr",
    "and",
    "or",
    "xor",
    "shl",
    "shr",
];

impl Operator {
    /// Match a method by name and argument count.
    pub fn from_method(name: &str, arg_count: usize) -> Option<Operator> {
        let token = name.strip_prefix("operator")?.trim();
        OPERATORS
            .iter()
            .copied()
            .find(|op| op.token() == token && op.arity().arg_count() == arg_count)
    }

    /// The C++ token following `operator`.
    pub fn token(self) -> &'static str {
        use Operator::*;
        match self {
            Minus | UnaryMinus => "-",
            Plus | UnaryPlus => "+",
            Times | Reference => "*",
            Div => "/",
            Mod => "%",
            Eq => "==",
            Neq => "!=",
            Lt => "<",
            Gt => ">",
            LtEq => "<=",
            GtEq => ">=",
            BinaryAnd => "&&",
            BinaryOr => "||",
            And => "&",
            Or => "|",
            Xor => "^",
            Shl => "<<",
            Shr => ">>",
            Index => "[]",
            PostIncrement | Increment => "++",
            PostDecrement | Decrement => "--",
            Not => "!",
            Inv => "~",
            PointerReference => "->",
            Assign => "=",
            PlusEquals => "+=",
        }
    }

    /// Snake-case word used in generated C names (`<cls>_op_<word>`).
    pub fn c_word(self) -> &'static str {
        use Operator::*;
        match self {
            Minus => "minus",
            Plus => "plus",
            Times => "times",
            Div => "divide",
            Mod => "mod",
            Eq => "eq",
            Neq => "neq",
            Lt => "lt",
            Gt => "gt",
            LtEq => "lteq",
            GtEq => "gteq",
            BinaryAnd => "binary_and",
            BinaryOr => "binary_or",
            And => "and",
            Or => "or",
            Xor => "xor",
            Shl => "shl",
            Shr => "shr",
            Index => "ind",
            PostIncrement => "post_increment",
            PostDecrement => "post_decrement",
            Increment => "increment",
            Decrement => "decrement",
            UnaryMinus => "unary_minus",
            UnaryPlus => "unary_plus",
            Not => "not",
            Inv => "inv",
            Reference => "reference",
            PointerReference => "pointer_reference",
            Assign => "assign",
            PlusEquals => "plus_equals",
        }
    }

    pub fn arity(self) -> Arity {
        use Operator::*;
        match self {
            Increment | Decrement | UnaryMinus | UnaryPlus | Not | Inv | Reference
            | PointerReference => Arity::Unary,
            _ => Arity::Binary,
        }
    }

    pub fn category(self) -> OperatorCategory {
        use Operator::*;
        match self {
            Assign | PlusEquals => OperatorCategory::Assignment,
            Index | PostIncrement | PostDecrement => OperatorCategory::NamedCall,
            _ if self.arity() == Arity::Unary => OperatorCategory::NamedCall,
            _ => OperatorCategory::DirectCall,
        }
    }

    pub fn kotlin(self) -> KotlinOperatorStyle {
        use KotlinOperatorStyle::*;
        use Operator::*;
        match self {
            Minus => OperatorSugar("minus"),
            Plus => OperatorSugar("plus"),
            Times => OperatorSugar("times"),
            Div => OperatorSugar("div"),
            Mod => OperatorSugar("rem"),
            Eq => Infix("eq"),
            Neq => Infix("neq"),
            Lt => Infix("lt"),
            Gt => Infix("gt"),
            LtEq => Infix("lteq"),
            GtEq => Infix("gteq"),
            BinaryAnd => Infix("binAnd"),
            BinaryOr => Infix("binOr"),
            And => Infix("and"),
            Or => Infix("or"),
            Xor => Infix("xor"),
            Shl => Infix("shl"),
            Shr => Infix("shr"),
            Index => OperatorSugar("get"),
            PostIncrement => DummyArgument("postIncrement"),
            PostDecrement => DummyArgument("postDecrement"),
            Increment => OperatorSugar("inc"),
            Decrement => OperatorSugar("dec"),
            UnaryMinus => OperatorSugar("unaryMinus"),
            UnaryPlus => OperatorSugar("unaryPlus"),
            Not => OperatorSugar("not"),
            Inv => Plain("inv"),
            Reference => Plain("reference"),
            PointerReference => Plain("pointerReference"),
            Assign => Infix("assign"),
            PlusEquals => Infix("plusEquals"),
        }
    }

    /// Whether the shim can write the operator as a native token.
    pub fn supports_direct_call(self) -> bool {
        self.category() == OperatorCategory::DirectCall
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operator{}", self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_direct_call() {
        let op = Operator::from_method("operator==", 1).unwrap();
        assert_eq!(op, Operator::Eq);
        assert_eq!(op.category(), OperatorCategory::DirectCall);
        assert_eq!(op.kotlin(), KotlinOperatorStyle::Infix("eq"));
    }

    #[test]
    fn test_index_is_named_call() {
        let op = Operator::from_method("operator[]", 1).unwrap();
        assert_eq!(op, Operator::Index);
        assert_eq!(op.category(), OperatorCategory::NamedCall);
        assert_eq!(op.kotlin(), KotlinOperatorStyle::OperatorSugar("get"));
    }

    #[test]
    fn test_prefix_increment_is_operator_sugar() {
        let op = Operator::from_method("operator++", 0).unwrap();
        assert_eq!(op, Operator::Increment);
        assert_eq!(op.kotlin(), KotlinOperatorStyle::OperatorSugar("inc"));
        assert_eq!(op.category(), OperatorCategory::NamedCall);
    }

    #[test]
    fn test_postfix_increment_takes_dummy_argument() {
        let op = Operator::from_method("operator++", 1).unwrap();
        assert_eq!(op, Operator::PostIncrement);
        assert_eq!(
            op.kotlin(),
            KotlinOperatorStyle::DummyArgument("postIncrement")
        );
        assert_eq!(op.category(), OperatorCategory::NamedCall);
    }

    #[test]
    fn test_minus_arity_disambiguates() {
        assert_eq!(Operator::from_method("operator-", 1), Some(Operator::Minus));
        assert_eq!(
            Operator::from_method("operator-", 0),
            Some(Operator::UnaryMinus)
        );
    }

    #[test]
    fn test_assignment_category() {
        let op = Operator::from_method("operator+=", 1).unwrap();
        assert_eq!(op.category(), OperatorCategory::Assignment);
        assert_eq!(op.c_word(), "plus_equals");
    }

    #[test]
    fn test_unknown_operator() {
        assert_eq!(Operator::from_method("operator()", 0), None);
        assert_eq!(Operator::from_method("operator==", 2), None);
        assert_eq!(Operator::from_method("compare", 1), None);
    }

    #[test]
    fn test_table_order_binaries_first() {
        let first_unary = OPERATORS
            .iter()
            .position(|op| op.arity() == Arity::Unary)
            .unwrap();
        let first_assign = OPERATORS
            .iter()
            .position(|op| op.category() == OperatorCategory::Assignment)
            .unwrap();
        assert!(OPERATORS[..first_unary]
            .iter()
            .all(|op| op.arity() == Arity::Binary));
        assert!(first_assign > first_unary);
    }

    #[test]
    fn test_infix_names_cover_infix_operators() {
        for op in OPERATORS {
            if let KotlinOperatorStyle::Infix(name) = op.kotlin() {
                assert!(INFIX_NAMES.contains(&name), "{} missing", name);
            }
        }
    }
}
