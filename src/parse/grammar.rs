use std::str::FromStr;

use rust_decimal::Decimal;
use winnow::ascii::{dec_int, digit1, till_line_ending};
use winnow::combinator::{
    alt, cut_err, delimited, not, opt, preceded, repeat, separated, terminated,
};
use winnow::error::{ContextError, ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};

use crate::{Adjustment, AdjustmentKind, ConditionRecord, Operator, RuleKind, RuleRecord, Value};

use super::parser::ParsedRules;

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Identifiers & keywords -------------------------------------------------

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A bare word that is not the prefix of a longer identifier.
fn keyword<'i>(kw: &'static str) -> impl Parser<&'i str, &'i str, ErrMode<ContextError>> {
    terminated(kw, not(one_of(is_word_char)))
}

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| is_word_char(c) || c == '.'),
    )
        .take()
        .parse_next(input)
}

// -- Literals ---------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn number<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (opt('-'), digit1, opt(('.', digit1)))
        .take()
        .parse_next(input)
}

fn decimal(input: &mut &str) -> ModalResult<Decimal> {
    let text = number.parse_next(input)?;
    Decimal::from_str(text).map_err(|_| ErrMode::from_input(input).cut())
}

fn number_value(input: &mut &str) -> ModalResult<Value> {
    let text = number.parse_next(input)?;
    if text.contains('.') {
        Decimal::from_str(text)
            .map(Value::Decimal)
            .map_err(|_| ErrMode::from_input(input).cut())
    } else {
        text.parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ErrMode::from_input(input).cut())
    }
}

fn list(input: &mut &str) -> ModalResult<Vec<Value>> {
    delimited(
        ('[', ws),
        separated(0.., value, (ws, ',', ws)),
        (ws, cut_err(']')),
    )
    .parse_next(input)
}

fn value(input: &mut &str) -> ModalResult<Value> {
    alt((
        list.map(Value::List),
        string_literal.map(Value::String),
        keyword("true").value(Value::Bool(true)),
        keyword("false").value(Value::Bool(false)),
        number_value,
    ))
    .context(StrContext::Expected(StrContextValue::Description("value")))
    .parse_next(input)
}

// -- Conditions -------------------------------------------------------------

fn operator(input: &mut &str) -> ModalResult<Operator> {
    alt((
        (keyword("not"), ws, keyword("in")).value(Operator::NotIn),
        (keyword("not"), ws, keyword("contains")).value(Operator::NotContains),
        keyword("in").value(Operator::In),
        keyword("contains").value(Operator::Contains),
        ">=".value(Operator::Gte),
        "<=".value(Operator::Lte),
        "==".value(Operator::Eq),
        "!=".value(Operator::Neq),
        ">".value(Operator::Gt),
        "<".value(Operator::Lt),
    ))
    .parse_next(input)
}

fn condition(input: &mut &str) -> ModalResult<ConditionRecord> {
    ws.parse_next(input)?;
    let field = ident
        .context(StrContext::Expected(StrContextValue::Description(
            "field path",
        )))
        .parse_next(input)?;
    ws.parse_next(input)?;
    let operator = cut_err(operator)
        .context(StrContext::Expected(StrContextValue::Description(
            "operator",
        )))
        .parse_next(input)?;
    ws.parse_next(input)?;
    let value = cut_err(value).parse_next(input)?;

    Ok(ConditionRecord {
        field: field.to_owned(),
        operator,
        value,
    })
}

fn when_clause(input: &mut &str) -> ModalResult<Vec<ConditionRecord>> {
    preceded(
        keyword("when"),
        separated(1.., cut_err(condition), (ws, keyword("and"))),
    )
    .parse_next(input)
}

// -- Adjustments ------------------------------------------------------------

fn adjustment(input: &mut &str) -> ModalResult<Adjustment> {
    ws.parse_next(input)?;
    let kind = alt((
        keyword("subtract").value(AdjustmentKind::SubtractFixed),
        keyword("percentage_off").value(AdjustmentKind::PercentageOff),
        keyword("fixed_price").value(AdjustmentKind::ReplaceFixed),
        keyword("multiply").value(AdjustmentKind::MultiplyBy),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "adjustment",
    )))
    .parse_next(input)?;
    ws.parse_next(input)?;
    let amount = cut_err(decimal)
        .context(StrContext::Expected(StrContextValue::Description(
            "amount",
        )))
        .parse_next(input)?;
    Ok(Adjustment::new(kind, amount))
}

fn then_clause(input: &mut &str) -> ModalResult<Adjustment> {
    preceded(keyword("then"), cut_err(adjustment)).parse_next(input)
}

// -- Rule definitions -------------------------------------------------------

#[derive(Debug, Clone)]
enum Annotation {
    Priority(i64),
    Id(i64),
    Exclusive,
    Disabled,
}

fn annotation(input: &mut &str) -> ModalResult<Annotation> {
    ws.parse_next(input)?;
    alt((
        preceded((keyword("priority"), ws), cut_err(dec_int::<_, i64, _>))
            .map(Annotation::Priority),
        preceded((keyword("id"), ws), cut_err(dec_int::<_, i64, _>)).map(Annotation::Id),
        keyword("exclusive").value(Annotation::Exclusive),
        keyword("disabled").value(Annotation::Disabled),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "priority, id, exclusive or disabled",
    )))
    .parse_next(input)
}

fn annotations(input: &mut &str) -> ModalResult<Vec<Annotation>> {
    delimited(
        (ws, '('),
        cut_err(separated(1.., annotation, (ws, ','))),
        (ws, cut_err(')')),
    )
    .parse_next(input)
}

struct RuleBody {
    kind: RuleKind,
    conditions: Vec<ConditionRecord>,
    adjustment: Option<Adjustment>,
}

fn rule_body(input: &mut &str) -> ModalResult<RuleBody> {
    ws.parse_next(input)?;
    let builtin = opt(alt((
        keyword("volume_discount").value(RuleKind::VolumeDiscount),
        keyword("customer_segment").value(RuleKind::CustomerSegment),
    )))
    .parse_next(input)?;
    ws.parse_next(input)?;
    let conditions = opt(when_clause).parse_next(input)?;
    ws.parse_next(input)?;
    // Built-in rules compute their own adjustment.
    let adjustment = if builtin.is_none() {
        opt(then_clause).parse_next(input)?
    } else {
        None
    };

    if builtin.is_none() && conditions.is_none() && adjustment.is_none() {
        return Err(ErrMode::from_input(input));
    }

    Ok(RuleBody {
        kind: builtin.unwrap_or_default(),
        conditions: conditions.unwrap_or_default(),
        adjustment,
    })
}

fn rule_def(input: &mut &str) -> ModalResult<RuleRecord> {
    ws.parse_next(input)?;
    keyword("rule").parse_next(input)?;
    ws.parse_next(input)?;

    let name = cut_err(ident)
        .context(StrContext::Expected(StrContextValue::Description(
            "rule name",
        )))
        .parse_next(input)?;

    let annotations = opt(annotations).parse_next(input)?.unwrap_or_default();

    ws.parse_next(input)?;
    cut_err(':').parse_next(input)?;

    let body = cut_err(rule_body)
        .context(StrContext::Expected(StrContextValue::Description(
            "rule body",
        )))
        .parse_next(input)?;

    let mut record = RuleRecord::new(name);
    for annotation in annotations {
        match annotation {
            Annotation::Priority(p) => record.priority = p,
            Annotation::Id(id) => record.id = Some(id),
            Annotation::Exclusive => record.exclusive = true,
            Annotation::Disabled => record.enabled = false,
        }
    }
    record.kind = body.kind;
    record.conditions = body.conditions;
    record.adjustment = body.adjustment;
    Ok(record)
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_rules(input: &mut &str) -> ModalResult<ParsedRules> {
    let records: Vec<RuleRecord> = repeat(0.., rule_def).parse_next(input)?;
    ws.parse_next(input)?;
    Ok(ParsedRules { records })
}
