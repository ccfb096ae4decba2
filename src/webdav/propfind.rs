use std::fmt::Display;

use quick_xml::{
    events::{BytesStart, Event},
    name::{Namespace, ResolveResult},
    reader::NsReader,
};
use url::Url;
use urlencoding::decode_binary;

use super::{entry::ResourceEntry, Error};

const DAV_NS: &[u8] = b"DAV:";

/// Only these properties are requested; anything else in the answer is skipped.
pub const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:">
  <D:prop>
    <D:resourcetype/>
    <D:getlastmodified/>
    <D:getcontenttype/>
  </D:prop>
</D:propfind>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Zero,
    One,
    Infinity,
}

impl Depth {
    pub fn header_value(&self) -> &'static str {
        match self {
            Depth::Zero => "0",
            Depth::One => "1",
            Depth::Infinity => "infinity",
        }
    }
}

impl Display for Depth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.header_value())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Property {
    ResourceType,
    LastModified,
    ContentType,
}

impl Property {
    fn from_local_name(name: &[u8]) -> Option<Property> {
        match name {
            b"resourcetype" => Some(Property::ResourceType),
            b"getlastmodified" => Some(Property::LastModified),
            b"getcontenttype" => Some(Property::ContentType),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Multistatus,
    Response,
    Href,
    Propstat,
    Status,
    Prop,
    Property(Property),
    PropertyChild(Property),
    Other,
}

#[derive(Default)]
struct PropValues {
    resource_kind: Option<String>,
    last_modified: Option<String>,
    content_type: Option<String>,
}

impl PropValues {
    fn slot(&mut self, property: Property) -> &mut Option<String> {
        match property {
            Property::ResourceType => &mut self.resource_kind,
            Property::LastModified => &mut self.last_modified,
            Property::ContentType => &mut self.content_type,
        }
    }

    fn append(&mut self, property: Property, word: &str) {
        let value = self.slot(property).get_or_insert_with(String::new);
        let word = word.trim();
        if word.is_empty() {
            return;
        }
        if !value.is_empty() {
            value.push(' ');
        }
        value.push_str(word);
    }

    fn merge_into(self, target: &mut PropValues) {
        if self.resource_kind.is_some() {
            target.resource_kind = self.resource_kind;
        }
        if self.last_modified.is_some() {
            target.last_modified = self.last_modified;
        }
        if self.content_type.is_some() {
            target.content_type = self.content_type;
        }
    }
}

#[derive(Default)]
struct ResponseBuilder {
    href: String,
    has_href: bool,
    props: PropValues,
}

struct PropstatBuilder {
    status_ok: bool,
    props: PropValues,
}

/// Walks a multi-status document, handing each `<response>` to `sink` in
/// document order. Entries pushed before a parse error stay with the caller.
pub fn parse_multistatus<F>(xml: &str, request_url: &Url, mut sink: F) -> Result<(), Error>
where
    F: FnMut(ResourceEntry),
{
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Tag> = Vec::new();
    let mut response: Option<ResponseBuilder> = None;
    let mut propstat: Option<PropstatBuilder> = None;

    loop {
        let (ns, event) = reader
            .read_resolved_event()
            .map_err(|e| Error::Protocol(format!("malformed multistatus: {}", e)))?;
        let is_dav = matches!(ns, ResolveResult::Bound(Namespace(DAV_NS)));

        match event {
            Event::Start(ref e) => {
                let tag = classify(stack.last().copied(), is_dav, e);
                open_tag(tag, e, &mut response, &mut propstat);
                stack.push(tag);
            }
            Event::Empty(ref e) => {
                let tag = classify(stack.last().copied(), is_dav, e);
                open_tag(tag, e, &mut response, &mut propstat);
                close_tag(tag, request_url, &mut response, &mut propstat, &mut sink)?;
            }
            Event::End(_) => {
                if let Some(tag) = stack.pop() {
                    close_tag(tag, request_url, &mut response, &mut propstat, &mut sink)?;
                }
            }
            Event::Text(ref e) => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::Protocol(format!("bad text in multistatus: {}", e)))?;
                on_text(stack.last().copied(), &text, &mut response, &mut propstat);
            }
            Event::CData(ref e) => {
                let text = String::from_utf8_lossy(e);
                on_text(stack.last().copied(), &text, &mut response, &mut propstat);
            }
            Event::Eof => break,
            _ => (),
        }
    }

    if response.is_some() {
        return Err(Error::Protocol(
            "multistatus ended inside a <response>".to_string(),
        ));
    }
    Ok(())
}

fn classify(parent: Option<Tag>, is_dav: bool, e: &BytesStart<'_>) -> Tag {
    let local = e.local_name();
    let local = local.as_ref();
    match parent {
        Some(Tag::Property(property)) => Tag::PropertyChild(property),
        Some(Tag::PropertyChild(_)) | Some(Tag::Other) => Tag::Other,
        _ if !is_dav => Tag::Other,
        None if local == b"multistatus" => Tag::Multistatus,
        Some(Tag::Multistatus) if local == b"response" => Tag::Response,
        Some(Tag::Response) if local == b"href" => Tag::Href,
        Some(Tag::Response) if local == b"propstat" => Tag::Propstat,
        Some(Tag::Propstat) if local == b"status" => Tag::Status,
        Some(Tag::Propstat) if local == b"prop" => Tag::Prop,
        Some(Tag::Prop) => Property::from_local_name(local).map_or(Tag::Other, Tag::Property),
        _ => Tag::Other,
    }
}

fn open_tag(
    tag: Tag,
    e: &BytesStart<'_>,
    response: &mut Option<ResponseBuilder>,
    propstat: &mut Option<PropstatBuilder>,
) {
    match tag {
        Tag::Response => *response = Some(ResponseBuilder::default()),
        Tag::Href => {
            if let Some(response) = response {
                response.has_href = true;
            }
        }
        Tag::Propstat => {
            *propstat = Some(PropstatBuilder {
                status_ok: true,
                props: PropValues::default(),
            })
        }
        Tag::Property(property) => {
            if let Some(propstat) = propstat {
                propstat.props.slot(property).get_or_insert_with(String::new);
            }
        }
        Tag::PropertyChild(property) => {
            let local = e.local_name();
            if let Some(propstat) = propstat {
                propstat
                    .props
                    .append(property, &String::from_utf8_lossy(local.as_ref()));
            }
        }
        _ => (),
    }
}

fn close_tag<F>(
    tag: Tag,
    request_url: &Url,
    response: &mut Option<ResponseBuilder>,
    propstat: &mut Option<PropstatBuilder>,
    sink: &mut F,
) -> Result<(), Error>
where
    F: FnMut(ResourceEntry),
{
    match tag {
        Tag::Propstat => {
            if let (Some(finished), Some(response)) = (propstat.take(), response.as_mut()) {
                if finished.status_ok {
                    finished.props.merge_into(&mut response.props);
                }
            }
        }
        Tag::Response => {
            if let Some(finished) = response.take() {
                sink(build_entry(finished, request_url)?);
            }
        }
        _ => (),
    }
    Ok(())
}

fn on_text(
    tag: Option<Tag>,
    text: &str,
    response: &mut Option<ResponseBuilder>,
    propstat: &mut Option<PropstatBuilder>,
) {
    match tag {
        Some(Tag::Href) => {
            if let Some(response) = response {
                response.href.push_str(text.trim());
            }
        }
        Some(Tag::Status) => {
            if let Some(propstat) = propstat {
                propstat.status_ok = status_line_is_success(text);
            }
        }
        Some(Tag::Property(property)) => {
            if let Some(propstat) = propstat {
                propstat.props.append(property, text);
            }
        }
        _ => (),
    }
}

fn status_line_is_success(line: &str) -> bool {
    line.split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .map_or(false, |code| (200..300).contains(&code))
}

fn build_entry(response: ResponseBuilder, request_url: &Url) -> Result<ResourceEntry, Error> {
    if !response.has_href || response.href.is_empty() {
        return Err(Error::Protocol("<response> without <href>".to_string()));
    }

    let url = request_url
        .join(&response.href)
        .map_err(|e| Error::Protocol(format!("bad href {}: {}", response.href, e)))?;
    let host = url.host_str().unwrap_or_default().to_string();
    let path = String::from_utf8_lossy(&decode_binary(url.path().as_bytes())).into_owned();

    let props = response.props;
    Ok(ResourceEntry::new(
        host,
        path,
        props.resource_kind.unwrap_or_default(),
        props.last_modified.unwrap_or_default(),
        props.content_type.unwrap_or_default(),
    ))
}
