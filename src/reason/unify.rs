//! Term unification and substitutions.
//!
//! Terms are flat (atoms or variables — no function symbols), so
//! unification is chain-following assignment. Rule variables are renamed
//! apart before every use so a rule can never capture a goal hole of the
//! same name.

use crate::model::{Term, TriplePattern};

/// Variable name → bound term (possibly another variable).
pub type Subst = hashbrown::HashMap<String, Term>;

/// Follow variable chains until an atom or an unbound variable.
pub fn resolve(term: &Term, subst: &Subst) -> Term {
    let mut current = term.clone();
    let mut hops = 0;
    while let Term::Hole(name) = &current {
        match subst.get(name) {
            Some(next) => {
                current = next.clone();
                // A cycle of variable aliases cannot bind anything
                hops += 1;
                if hops > subst.len() {
                    return current;
                }
            }
            None => break,
        }
    }
    current
}

/// Unify two terms under `subst`, extending it on success.
pub fn unify(a: &Term, b: &Term, subst: &mut Subst) -> bool {
    let ra = resolve(a, subst);
    let rb = resolve(b, subst);
    match (&ra, &rb) {
        (Term::Atom(x), Term::Atom(y)) => x == y,
        (Term::Hole(name), other) | (other, Term::Hole(name)) => {
            if let Term::Hole(other_name) = other {
                if other_name == name {
                    return true;
                }
            }
            subst.insert(name.clone(), other.clone());
            true
        }
    }
}

/// Unify two triple patterns slot-wise (polarities must agree).
pub fn unify_patterns(a: &TriplePattern, b: &TriplePattern, subst: &mut Subst) -> bool {
    a.polarity == b.polarity
        && unify(&a.subject, &b.subject, subst)
        && unify(&a.relation, &b.relation, subst)
        && unify(&a.object, &b.object, subst)
}

/// Apply a substitution to every slot of a pattern.
pub fn apply(pattern: &TriplePattern, subst: &Subst) -> TriplePattern {
    TriplePattern {
        subject: resolve(&pattern.subject, subst),
        relation: resolve(&pattern.relation, subst),
        object: resolve(&pattern.object, subst),
        polarity: pattern.polarity,
    }
}

/// Rename every variable in a rule pattern apart: `x` → `x~n`.
pub fn rename_apart(pattern: &TriplePattern, suffix: u64) -> TriplePattern {
    let rename = |t: &Term| match t {
        Term::Hole(name) => Term::Hole(format!("{name}~{suffix}")),
        atom => atom.clone(),
    };
    TriplePattern {
        subject: rename(&pattern.subject),
        relation: rename(&pattern.relation),
        object: rename(&pattern.object),
        polarity: pattern.polarity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Atom, Polarity};

    fn atom(n: u32) -> Term {
        Term::Atom(Atom(n))
    }

    fn hole(name: &str) -> Term {
        Term::Hole(name.to_owned())
    }

    #[test]
    fn test_atom_unifies_with_itself_only() {
        let mut subst = Subst::new();
        assert!(unify(&atom(1), &atom(1), &mut subst));
        assert!(!unify(&atom(1), &atom(2), &mut subst));
    }

    #[test]
    fn test_hole_binds_and_resolves() {
        let mut subst = Subst::new();
        assert!(unify(&hole("x"), &atom(7), &mut subst));
        assert_eq!(resolve(&hole("x"), &subst), atom(7));
        // Bound hole now behaves like its atom
        assert!(unify(&hole("x"), &atom(7), &mut subst));
        assert!(!unify(&hole("x"), &atom(8), &mut subst));
    }

    #[test]
    fn test_variable_chains_resolve_through() {
        let mut subst = Subst::new();
        assert!(unify(&hole("x"), &hole("y"), &mut subst));
        assert!(unify(&hole("y"), &atom(3), &mut subst));
        assert_eq!(resolve(&hole("x"), &subst), atom(3));
    }

    #[test]
    fn test_pattern_unification_extends_subst() {
        let mut subst = Subst::new();
        let goal = TriplePattern {
            subject: atom(1),
            relation: atom(2),
            object: atom(3),
            polarity: Polarity::Pos,
        };
        let head = TriplePattern {
            subject: hole("x"),
            relation: atom(2),
            object: hole("z"),
            polarity: Polarity::Pos,
        };
        assert!(unify_patterns(&goal, &head, &mut subst));
        assert_eq!(resolve(&hole("x"), &subst), atom(1));
        assert_eq!(resolve(&hole("z"), &subst), atom(3));
    }

    #[test]
    fn test_rename_apart_avoids_capture() {
        let pattern = TriplePattern {
            subject: hole("x"),
            relation: atom(2),
            object: hole("x"),
            polarity: Polarity::Pos,
        };
        let renamed = rename_apart(&pattern, 4);
        assert_eq!(renamed.subject, hole("x~4"));
        assert_eq!(renamed.object, hole("x~4"));
    }
}
