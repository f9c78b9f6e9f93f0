// Bootstrap class library
// Stub sources for the handful of library types every compilation can see

use crate::hooks::NoHooks;
use crate::parser::SourceParser;
use crate::profile::ParseMode;
use crate::types::{ClassTable, TypeEnvironment};
use lazy_static::lazy_static;

const JAVA_LANG: &str = r#"
package java.lang;

public class Object {
    String toString();
    int hashCode();
    boolean equals(Object other);
}

public final class String {
    int length();
    char charAt(int index);
    String substring(int begin, int end);
    String trim();
    boolean isEmpty();
}

public final class Boolean { boolean booleanValue(); }
public final class Byte { byte byteValue(); }
public final class Short { short shortValue(); }
public final class Character { char charValue(); }
public final class Integer { int intValue(); }
public final class Long { long longValue(); }
public final class Float { float floatValue(); }
public final class Double { double doubleValue(); }

public interface Iterable<T> {
    java.util.Iterator<T> iterator();
}

public interface Runnable {
    void run();
}
"#;

const JAVA_UTIL: &str = r#"
package java.util;

public interface Iterator<E> {
    boolean hasNext();
    E next();
}

public interface Collection<E> extends Iterable<E> {
    int size();
    boolean isEmpty();
    boolean add(E element);
}

public interface List<E> extends Collection<E> {
    E get(int index);
}

public interface Set<E> extends Collection<E> {
}

public class ArrayList<E> implements List<E> {
}

public class HashSet<E> implements Set<E> {
}

public interface Map<K, V> {
    V get(Object key);
    V put(K key, V value);
    Set<K> keySet();
    Collection<V> values();
    int size();
}

public class HashMap<K, V> implements Map<K, V> {
}
"#;

const LOMBOK: &str = r#"
package lombok;

public @interface val {
}
"#;

const SOURCES: [(&str, &str); 3] = [
    ("java/lang/package.java", JAVA_LANG),
    ("java/util/package.java", JAVA_UTIL),
    ("lombok/val.java", LOMBOK),
];

lazy_static! {
    static ref BOOTSTRAP: TypeEnvironment = build();
}

pub(crate) fn environment() -> &'static TypeEnvironment {
    &BOOTSTRAP
}

fn build() -> TypeEnvironment {
    let parser = SourceParser::new(ParseMode::Full, &NoHooks);

    let units: Vec<_> = SOURCES
        .iter()
        .map(|(path, source)| {
            parser
                .parse_unit(source, Some(path.to_string()))
                .unwrap_or_else(|error| panic!("bootstrap source {path} does not parse: {error}"))
        })
        .collect();

    let mut table = ClassTable::default();
    if let Err(errors) = table.declare_units(&units.iter().collect::<Vec<_>>()) {
        panic!("bootstrap library does not declare cleanly: {errors:?}");
    }

    TypeEnvironment::from_table(table)
        .unwrap_or_else(|error| panic!("bootstrap library is incomplete: {error:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeBinding;

    #[test]
    fn test_bootstrap_declares_library_types() {
        let env = environment();

        for name in [
            "java.lang.Object",
            "java.lang.String",
            "java.lang.Iterable",
            "java.util.List",
            "java.util.ArrayList",
            "java.util.Map",
            "lombok.val",
        ] {
            assert!(env.lookup(name).is_some(), "{name} should be declared");
        }
    }

    #[test]
    fn test_bootstrap_interfaces_reach_iterable() {
        let env = environment();
        let list = env.lookup("java.util.List").unwrap();

        let found = env
            .find_super_type_originating_from(&TypeBinding::Class(list), env.iterable_id())
            .unwrap();
        assert_eq!(found, TypeBinding::Class(env.iterable_id()));
    }
}
