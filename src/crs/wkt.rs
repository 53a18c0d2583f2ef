use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, map},
    multi::separated_list0,
    number::complete::double,
    sequence::{delimited, preceded, tuple},
    IResult,
};

use super::Crs;


#[derive(Debug, Clone, PartialEq)]
pub enum WktItem {
    Node(WktNode),
    Text(String),
    Number(f64),
}

/// One `KEYWORD[item, ...]` element of a well-known-text CRS definition.
#[derive(Debug, Clone, PartialEq)]
pub struct WktNode {
    pub keyword: String,
    pub items: Vec<WktItem>,
}

impl WktNode {
    /// The leading quoted string, e.g. the CRS or datum name.
    pub fn name(&self) -> Option<&str> {
        match self.items.first() {
            Some(WktItem::Text(name)) => Some(name),
            _ => None,
        }
    }

    pub fn child(&self, keyword: &str) -> Option<&WktNode> {
        self.items.iter().find_map(|item| match item {
            WktItem::Node(node) if node.keyword.eq_ignore_ascii_case(keyword) => Some(node),
            _ => None,
        })
    }

    fn epsg_authority(&self) -> Option<u32> {
        let authority = self.child("AUTHORITY")?;
        match (authority.items.get(0), authority.items.get(1)) {
            (Some(WktItem::Text(name)), Some(WktItem::Text(code))) if name.eq_ignore_ascii_case("EPSG") => {
                code.trim().parse().ok()
            }
            (Some(WktItem::Text(name)), Some(WktItem::Number(code))) if name.eq_ignore_ascii_case("EPSG") => {
                Some(*code as u32)
            }
            _ => None,
        }
    }
}

fn quoted(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        |s: &str| s.to_string(),
    )(input)
}

fn keyword(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn node(input: &str) -> IResult<&str, WktNode> {
    let (input, (keyword, items)) = tuple((
        keyword,
        delimited(
            preceded(multispace0, alt((char('['), char('(')))),
            separated_list0(delimited(multispace0, char(','), multispace0), item),
            preceded(multispace0, alt((char(']'), char(')')))),
        ),
    ))(input)?;

    Ok((input, WktNode { keyword: keyword.to_string(), items }))
}

fn item(input: &str) -> IResult<&str, WktItem> {
    preceded(
        multispace0,
        alt((
            map(quoted, WktItem::Text),
            map(node, WktItem::Node),
            map(double, WktItem::Number),
        )),
    )(input)
}

pub fn parse_wkt(text: &str) -> Option<WktNode> {
    all_consuming(delimited(multispace0, node, multispace0))(text)
        .ok()
        .map(|(_, node)| node)
}

/// Best-effort identification of the CRS described by a `.prj` file.
///
/// An EPSG `AUTHORITY` on the root element is trusted first, then the ESRI
/// and OGC names used by the common US datasets.
pub fn identify_prj(text: &str) -> Option<Crs> {
    let root = parse_wkt(text)?;

    if let Some(code) = root.epsg_authority() {
        return Some(Crs::new(code));
    }

    let name = root.name()?.to_ascii_lowercase().replace(' ', "_");
    match root.keyword.to_ascii_uppercase().as_str() {
        "GEOGCS" => match name.as_str() {
            "gcs_wgs_1984" | "wgs_84" | "wgs84" => Some(Crs::WGS84),
            "gcs_north_american_1983" | "nad83" => Some(Crs::NAD83),
            _ => None,
        },
        "PROJCS" => {
            if name.contains("web_mercator") || name.contains("pseudo-mercator") {
                Some(Crs::WEB_MERCATOR)
            } else if name.contains("albers") && (name.contains("conus") || name.contains("contiguous")) {
                Some(Crs::CONUS_ALBERS)
            } else {
                None
            }
        }
        _ => None,
    }
}
