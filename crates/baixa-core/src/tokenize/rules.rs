use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

pub const CNPJ: &str = r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}";
pub const CPF: &str = r"\d{3}\.\d{3}\.\d{3}-\d{2}";
const PHONE: &str = r"\(\d{2}\)\s?\d{4,5}-\d{4}";

/// Upper bound on fixpoint passes over the rule list.
const MAX_PASSES: usize = 4;

/// A pure transform that inserts a line break between two glued sub-matches.
#[derive(Debug)]
pub struct BoundaryRule {
    pub name: &'static str,
    regex: Regex,
    replacement: &'static str,
}

impl BoundaryRule {
    fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        BoundaryRule {
            name,
            regex: Regex::new(pattern).expect("boundary rule pattern is valid"),
            replacement,
        }
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.regex.replace_all(text, self.replacement)
    }
}

/// Boundary rules for fields that PDF text streams glue together, in order.
pub static GLUED_RULES: LazyLock<Vec<BoundaryRule>> = LazyLock::new(|| {
    let tax_id = format!("{CNPJ}|{CPF}");
    vec![
        BoundaryRule::new(
            "digits_before_tax_id",
            &format!(r"(\d{{14}}|\d{{11}})({tax_id})"),
            "${1}\n${2}",
        ),
        BoundaryRule::new(
            "tax_id_before_digits",
            &format!(r"({tax_id})(\d{{14}}|\d{{11}}|\d{{2}}/\d{{4}})"),
            "${1}\n${2}",
        ),
        BoundaryRule::new(
            "cpf_before_cnpj",
            &format!(r"({CPF})({CNPJ})(\p{{Lu}}{{2}}\b)?"),
            "${1}\n${2}\n${3}",
        ),
        BoundaryRule::new(
            "cnpj_before_cpf",
            &format!(r"({CNPJ})({CPF})(\p{{Lu}}{{2}}\b)?"),
            "${1}\n${2}\n${3}",
        ),
        BoundaryRule::new(
            "upper_before_tax_id",
            &format!(r"(\p{{Lu}}{{2,}})({tax_id})"),
            "${1}\n${2}",
        ),
        BoundaryRule::new("upper_before_digits", r"(\p{Lu}{2,})(\d+)", "${1}\n${2}"),
        BoundaryRule::new(
            "digits_before_month_date",
            r"(\d{4})([a-z]{3}/\d{4})",
            "${1}\n${2}",
        ),
        BoundaryRule::new(
            "month_date_before_label",
            r"([a-z]{3}/\d{4})(\p{Lu}{2,})",
            "${1}\n${2}",
        ),
        BoundaryRule::new(
            "phone_before_phone",
            &format!(r"({PHONE})({PHONE})"),
            "${1}\n${2}",
        ),
        BoundaryRule::new("phone_before_digits", &format!(r"({PHONE})(\d+)"), "${1}\n${2}"),
    ]
});

/// Apply `rules` in order, repeating until the text stops changing.
pub fn apply_rules(text: &str, rules: &[BoundaryRule]) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_PASSES {
        let mut changed = false;
        for rule in rules {
            if let Cow::Owned(next) = rule.apply(&current) {
                changed |= next != current;
                current = next;
            }
        }
        if !changed {
            break;
        }
    }
    current
}

pub fn apply_glued_rules(text: &str) -> String {
    apply_rules(text, &GLUED_RULES)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str) -> &'static BoundaryRule {
        GLUED_RULES
            .iter()
            .find(|r| r.name == name)
            .expect("rule exists")
    }

    #[test]
    fn test_upper_before_tax_id() {
        let out = rule("upper_before_tax_id").apply("ENGELMANN011.178.841-20");
        assert_eq!(out, "ENGELMANN\n011.178.841-20");
    }

    #[test]
    fn test_digits_before_tax_id() {
        let out = rule("digits_before_tax_id").apply("1234567890112.345.678/0001-95");
        assert_eq!(out, "12345678901\n12.345.678/0001-95");
    }

    #[test]
    fn test_tax_id_before_period() {
        let out = rule("tax_id_before_digits").apply("12.345.678/0001-9504/2025");
        assert_eq!(out, "12.345.678/0001-95\n04/2025");
    }

    #[test]
    fn test_cpf_before_cnpj_with_state() {
        let out = rule("cpf_before_cnpj").apply("111.222.333-4412.345.678/0001-95SP");
        assert_eq!(out, "111.222.333-44\n12.345.678/0001-95\nSP");
    }

    #[test]
    fn test_month_date_split_from_label() {
        let out = apply_glued_rules("2025jan/2025DARF");
        assert_eq!(out, "2025\njan/2025\nDARF");
    }

    #[test]
    fn test_phone_pair_then_digits() {
        let out = apply_glued_rules("(11) 3333-4444(11) 5555-66661234");
        assert_eq!(out, "(11) 3333-4444\n(11) 5555-6666\n1234");
    }

    #[test]
    fn test_month_de_untouched() {
        assert_eq!(apply_glued_rules("Janeiro de 2025"), "Janeiro de 2025");
    }

    #[test]
    fn test_no_match_is_identity() {
        assert_eq!(apply_glued_rules("Simples Nacional"), "Simples Nacional");
    }
}
