use super::ACK;
use crate::error::{EncodingError, ProtocolError};
use core::str::FromStr;
use nom::{
    bytes::complete::{tag, take_until},
    character::complete::{i64 as decimal, multispace0},
    combinator::{all_consuming, rest},
    multi::many0,
    sequence::{preceded, terminated, tuple},
    IResult,
};

/// `*` + command + carriage return
pub fn encode_command(command: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(command.len() + 2);
    frame.push(b'*');
    frame.extend_from_slice(command.as_bytes());
    frame.push(b'\r');
    frame
}

/// Decodes a reply as ASCII, dropping surrounding whitespace and a leading ACK
pub fn decode_reply(raw: &[u8]) -> Result<String, EncodingError> {
    if let Some(b) = raw.iter().find(|b| !b.is_ascii()) {
        return Err(EncodingError::NonAscii(*b));
    }
    let text: String = raw.iter().map(|b| *b as char).collect();
    Ok(text
        .trim()
        .trim_start_matches(ACK as char)
        .trim()
        .to_string())
}

/// Selects the `n`-th field of a reply such as `Previous tint:\t  500\rConfigured tint:\t  500`
pub fn nth_field<'a>(reply: &'a str, separator: &str, n: usize) -> Result<&'a str, ProtocolError> {
    let unexpected = || ProtocolError::UnexpectedReply(reply.to_string());
    let parsed: IResult<&'a str, (Vec<&'a str>, &'a str)> = tuple((
        many0(terminated(take_until(separator), tag(separator))),
        rest,
    ))(reply);
    let (_, (mut split, tail)) = parsed.map_err(|_| unexpected())?;
    split.push(tail);
    split.get(n).copied().map(str::trim).ok_or_else(unexpected)
}

pub fn parse_number<T: FromStr>(field: &str) -> Result<T, EncodingError> {
    field
        .trim()
        .parse()
        .map_err(|_| EncodingError::InvalidNumber(field.to_string()))
}

/// Whitespace separated integers of an ASCII spectrum
pub fn parse_ascii_spectrum(text: &str) -> Result<Vec<i64>, EncodingError> {
    let parsed: IResult<&str, Vec<i64>> =
        all_consuming(terminated(many0(preceded(multispace0, decimal)), multispace0))(text);
    match parsed {
        Ok((_, values)) => Ok(values),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(EncodingError::InvalidNumber(
            e.input.split_whitespace().next().unwrap_or_default().to_string(),
        )),
        Err(nom::Err::Incomplete(_)) => Err(EncodingError::InvalidNumber(text.to_string())),
    }
}
