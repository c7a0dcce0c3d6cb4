use fits_keywords::record::{ArrayData, DataType, Field, FieldValue, Scalar};
use fits_keywords::shape::format_shape;
use fits_keywords::{get_keywords, KeywordList, Record};
use std::fs::File;
use std::io::BufReader;
use std::process;

fn format_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Bool(b) => (if *b { "T" } else { "F" }).to_string(),
        Scalar::UChar(v) => v.to_string(),
        Scalar::Short(v) => v.to_string(),
        Scalar::Int(v) => v.to_string(),
        Scalar::UInt(v) => v.to_string(),
        Scalar::Int64(v) => v.to_string(),
        Scalar::Float(v) => format!("{:?}", v),
        Scalar::Double(v) => format!("{:?}", v),
        Scalar::Complex([re, im]) => format!("({:?}, {:?})", re, im),
        Scalar::DComplex([re, im]) => format!("({:?}, {:?})", re, im),
        Scalar::String(s) => format!("'{}'", s),
    }
}

fn format_elements(data: &ArrayData) -> String {
    let items: Vec<String> = (0..data.len())
        .filter_map(|i| data.get(i))
        .map(|s| format_scalar(&s))
        .collect();
    format!("[{}]", items.join(", "))
}

fn type_label(data_type: DataType) -> String {
    match data_type {
        DataType::Scalar(kind) => format!("{:?}", kind),
        DataType::Array(kind) => format!("{:?} array", kind),
        DataType::Record => "Record".to_string(),
    }
}

fn format_field(field: &Field) -> String {
    let value = match &field.value {
        FieldValue::Scalar(s) => format_scalar(s),
        FieldValue::Array(a) => format!("{} {}", format_shape(a.shape()), format_elements(a.data())),
        FieldValue::Record(r) => format!("{} fields", r.len()),
    };
    let mut out = format!(
        "{:<10} {:<14} {}",
        field.name,
        type_label(field.value.data_type()),
        value
    );
    if !field.comment.is_empty() {
        out.push_str(&format!(" / {}", field.comment));
    }
    out
}

fn format_record(record: &Record) -> String {
    let mut out = String::new();
    for field in record {
        out.push_str(&format_field(field));
        out.push('\n');
    }
    out
}

fn format_cards(list: &KeywordList) -> String {
    let mut out = String::new();
    for card in list {
        let kw = card.keyword_str();
        match (&card.value, &card.comment) {
            (Some(val), Some(comment)) => {
                out.push_str(&format!("{:<8} = {:?} / {}\n", kw, val, comment));
            }
            (Some(val), None) => out.push_str(&format!("{:<8} = {:?}\n", kw, val)),
            (None, Some(text)) => out.push_str(&format!("{:<8} {}\n", kw, text)),
            (None, None) => {
                if !card.is_blank() {
                    out.push_str(&format!("{}\n", kw));
                }
            }
        }
    }
    out
}

fn usage() -> String {
    "Usage: fitskeys [-c] [-i NAME]... <file.fits>\n\n\
     Decode the primary header of a FITS file into keyword fields.\n\n\
     Options:\n  \
     -c, --cards        print the raw cards instead of decoded fields\n  \
     -i, --ignore NAME  skip the keyword NAME (repeatable)"
        .to_string()
}

fn run(args: &[String]) -> Result<String, String> {
    let mut raw_cards = false;
    let mut ignore: Vec<&str> = Vec::new();
    let mut file_path = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-c" | "--cards" => raw_cards = true,
            "-i" | "--ignore" => {
                let name = iter
                    .next()
                    .ok_or_else(|| format!("Option {} needs a keyword name", arg))?;
                ignore.push(name.as_str());
            }
            s if s.starts_with('-') => return Err(format!("Unknown option: {}", arg)),
            _ => {
                if file_path.is_some() {
                    return Err("Too many arguments".to_string());
                }
                file_path = Some(arg.as_str());
            }
        }
    }

    let path = file_path.ok_or_else(usage)?;

    let file = File::open(path).map_err(|e| format!("Error reading '{}': {}", path, e))?;
    let list = KeywordList::read_from(BufReader::new(file))
        .map_err(|e| format!("Error parsing '{}': {}", path, e))?;

    if raw_cards {
        return Ok(format_cards(&list));
    }

    let mut record = Record::new();
    if !get_keywords(&mut record, &list, &ignore) {
        return Err(format!("'{}' does not start with a primary header", path));
    }
    Ok(format_record(&record))
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(output) => print!("{}", output),
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(1);
        }
    }
}
