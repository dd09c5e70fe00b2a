/// Builds a [`Value`](crate::Value) from a literal-like syntax.
///
/// Arrays use `[...]`, maps use `{key: value}` with literal keys of any kind,
/// and anything else goes through `Value::from`.
///
/// ```rust
/// use rmxml::{value, Value};
///
/// let party = value!({"gold": 500, "members": ["ralph", "ulrika"], 1: nil});
/// let map = party.as_map().unwrap();
/// assert_eq!(map.get(&Value::from("gold")), Some(&Value::from(500)));
/// assert_eq!(map.get(&Value::from(1)), Some(&Value::Nil));
/// ```
#[macro_export]
macro_rules! value {
    (nil) => {
        $crate::Value::Nil
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::value!($elem)),*])
    };

    ({}) => {
        $crate::Value::Map($crate::ValueMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut map = $crate::ValueMap::new();
        $(
            map.insert($crate::Value::from($key), $crate::value!($value));
        )*
        $crate::Value::Map(map)
    }};

    ($other:expr) => {
        $crate::Value::from($other)
    };
}
