// src/common/normalize.rs
//
// Primitivas de normalização compartilhadas pela captação de leads,
// pelo motor de duplicados e pelas sugestões de vínculo de funcionários.

use std::str::FromStr;

use rust_decimal::Decimal;
use validator::ValidateEmail;

pub const DEFAULT_COUNTRY_CODE: &str = "+55";

pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// "+55", "55", " 055 " -> "+55". Vazio ou longo demais -> None.
pub fn normalize_country_code(raw: &str) -> Option<String> {
    let digits = digits_only(raw);
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() || digits.len() > 3 {
        return None;
    }
    Some(format!("+{}", digits))
}

// =========================================================================
//  TELEFONES
// =========================================================================

/// Telefone já separado em DDI (`+55`) e número nacional (só dígitos).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPhone {
    pub country_code: String,
    pub national: String,
}

impl NormalizedPhone {
    /// Normaliza um telefone digitado livremente.
    /// Sem DDI explícito, o DDI é deduzido pelo tamanho do número.
    pub fn parse(raw: &str, country_code: Option<&str>) -> Option<Self> {
        let mut national = digits_only(raw);
        if national.is_empty() {
            return None;
        }

        let country_code = match country_code.and_then(normalize_country_code) {
            Some(cc) => cc,
            None => match infer_country_code(&national) {
                Some((cc, rest)) => {
                    national = rest;
                    cc
                }
                None => DEFAULT_COUNTRY_CODE.to_string(),
            },
        };

        // Número que já veio com o DDI na frente ("5533998410016" com DDI 55)
        let cc_digits = &country_code[1..];
        let embedded = national.len() > 11 || (cc_digits == "1" && national.len() == 11);
        if embedded {
            if let Some(rest) = national.strip_prefix(cc_digits) {
                national = rest.to_string();
            }
        }

        if national.is_empty() {
            return None;
        }

        Some(Self { country_code, national })
    }

    /// Chave canônica: dígitos do DDI + número nacional, sem pontuação.
    pub fn full(&self) -> String {
        format!("{}{}", &self.country_code[1..], self.national)
    }

    pub fn display(&self) -> String {
        format_phone_display(&self.full())
    }
}

/// Chave canônica de um telefone digitado, com o DDI padrão quando o número não traz um.
/// É a mesma chave que a captação grava em `contact_phones.number`.
pub fn canonical_phone(raw: &str, default_country_code: &str) -> Option<String> {
    NormalizedPhone::parse(raw, Some(default_country_code)).map(|phone| phone.full())
}

fn infer_country_code(digits: &str) -> Option<(String, String)> {
    match digits.len() {
        11 if digits.starts_with('1') => Some(("+1".to_string(), digits[1..].to_string())),
        10 | 11 => Some((DEFAULT_COUNTRY_CODE.to_string(), digits.to_string())),
        12 | 13 if digits.starts_with("55") => {
            Some((DEFAULT_COUNTRY_CODE.to_string(), digits[2..].to_string()))
        }
        _ => None,
    }
}

/// Formata a chave canônica para exibição: "5533998410016" -> "+55 (33) 99841-0016".
pub fn format_phone_display(full: &str) -> String {
    let digits = digits_only(full);

    if let Some(rest) = digits.strip_prefix("55") {
        match rest.len() {
            11 => return format!("+55 ({}) {}-{}", &rest[..2], &rest[2..7], &rest[7..]),
            10 => return format!("+55 ({}) {}-{}", &rest[..2], &rest[2..6], &rest[6..]),
            _ => {}
        }
    }

    if let Some(rest) = digits.strip_prefix('1') {
        if rest.len() == 10 {
            return format!("+1 ({}) {}-{}", &rest[..3], &rest[3..6], &rest[6..]);
        }
    }

    format!("+{}", digits)
}

// =========================================================================
//  DOCUMENTOS, NOMES E E-MAILS
// =========================================================================

pub fn normalize_cpf(raw: &str) -> Option<String> {
    normalize_document(raw, 11)
}

pub fn normalize_cnpj(raw: &str) -> Option<String> {
    normalize_document(raw, 14)
}

fn normalize_document(raw: &str, expected_len: usize) -> Option<String> {
    let digits = digits_only(raw);
    if digits.len() != expected_len {
        return None;
    }
    // "00000000000" e afins são preenchimento, não identidade
    let first = digits.chars().next()?;
    if digits.chars().all(|c| c == first) {
        return None;
    }
    Some(digits)
}

/// Caixa baixa + espaços colapsados. Usado como chave de agrupamento por nome.
pub fn normalize_name(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    Some(collapsed.to_lowercase())
}

pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.validate_email() {
        Some(email)
    } else {
        None
    }
}

// =========================================================================
//  CAMPOS NUMÉRICOS E BOOLEANOS DE FORMULÁRIO
// =========================================================================

/// Lê valores como "5.000,00", "R$ 3500", "1,234.56". Entrada inválida vira None.
pub fn parse_locale_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        (None, Some(_)) if is_thousands_grouped(&cleaned) => cleaned.replace('.', ""),
        _ => cleaned,
    };

    Decimal::from_str(&normalized)
        .ok()
        .filter(|value| !value.is_sign_negative())
}

fn is_thousands_grouped(value: &str) -> bool {
    let mut groups = value.split('.');
    let head_ok = groups
        .next()
        .map(|head| !head.is_empty() && head.len() <= 3)
        .unwrap_or(false);
    head_ok && groups.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

/// Checkbox/select de formulário: "sim", "on", "true", "1" ...
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "sim" | "s" | "true" | "1" | "on" | "yes" | "y" => Some(true),
        "não" | "nao" | "n" | "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}
