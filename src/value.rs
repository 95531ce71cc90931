/// Runtime value of a slug expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    None,
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// `False` and `None` are falsey, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::None => false,
            Value::Integer(_) | Value::Float(_) | Value::String(_) => true,
        }
    }

    /// Name of the value's kind, used in runtime error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::None => "None",
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "str",
        }
    }

    /// Numeric view for mixed int/float arithmetic and comparison.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            Value::Bool(_) | Value::None | Value::String(_) => None,
        }
    }

    /// Equality as seen by `==`: integers and floats compare by exact
    /// numeric value.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                integral_equals(*a, *b)
            }
            _ => self == other,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(true) => write!(f, "True"),

            Value::Bool(false) => write!(f, "False"),

            Value::None => write!(f, "None"),

            Value::Integer(n) => write!(f, "{}", n),

            Value::Float(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),
        }
    }
}

/// `true` when `f` is exactly the integer `n`.  `n as f64` would round
/// above 2^53, so the float is converted instead, after checking it is
/// integral and inside the `i64` range (`i64::MAX as f64` is 2^63).
fn integral_equals(n: i64, f: f64) -> bool {
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 && f as i64 == n
}
