use std::fs;
use std::mem;
use std::str;

use log::debug;
use quick_xml::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::core::{EmptyResult, GenericError, GenericResult};

use super::mapping::{self, RecordMapping};
use super::{Appendices, Appendix2, Envelope, Header, Record, Section2, TaxDeclaration};

pub fn read(path: &str) -> GenericResult<TaxDeclaration> {
    let data = fs::read_to_string(path)?;
    parse(&data)
}

pub fn save(declaration: &TaxDeclaration, path: &str) -> EmptyResult {
    let data = serialize(declaration)?;
    let temp_path = format!("{}.new", path);

    fs::write(&temp_path, data).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        format!("Failed to save the tax declaration to {:?}: {}", temp_path, e)
    })?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        format!("Failed to rename {:?} to {:?}: {}", temp_path, path, e)
    })?;

    debug!("The tax declaration has been saved to {:?}.", path);
    Ok(())
}

fn parse(data: &str) -> GenericResult<TaxDeclaration> {
    let mut reader = Reader::from_str(data);
    reader.config_mut().trim_text(true);

    let mut root = None;
    let mut form = None;
    let mut records = Vec::new();
    let mut depth = 0;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                let record = parse_element(&element)?;

                match depth {
                    0 => root = Some(record),
                    1 if form.is_none() => form = Some(record),
                    _ => return Err!("Unexpected {} element", record.name),
                }

                depth += 1;
            },

            Event::Empty(element) => {
                let record = parse_element(&element)?;

                match depth {
                    1 if form.is_none() => form = Some(record),
                    2 => records.push(record),
                    _ => return Err!("Unexpected {} element", record.name),
                }
            },

            Event::End(_) => depth -= 1,
            Event::Text(text) => return Err!("Unexpected text: {:?}", String::from_utf8_lossy(&text)),
            Event::Eof => break,

            _ => {},
        }
    }

    let (Some(root), Some(form)) = (root, form) else {
        return Err!("Unexpected document structure: no declaration form");
    };

    assemble(Envelope {root, form}, records)
}

fn assemble(envelope: Envelope, records: Vec<Record>) -> GenericResult<TaxDeclaration> {
    let mut header: Option<Header> = None;
    let mut section2: Option<Section2> = None;
    let mut appendices = Appendices::default();
    let mut appendix2_totals: Option<Appendix2> = None;
    let mut other_records = Vec::new();

    for record in records {
        let parse_error = |e: GenericError| format!("Failed to parse {} record: {}", record.name, e);

        match record.name.as_str() {
            mapping::HEADER => set_once(&mut header, &record)?,
            mapping::SECTION2 => set_once(&mut section2, &record)?,

            mapping::INCOME_TABLE => appendices.income_table.push(
                mapping::from_record(&record).map_err(parse_error)?),
            mapping::SECURITIES_LIST => appendices.securities_list.push(
                mapping::from_record(&record).map_err(parse_error)?),
            mapping::APPENDIX3 => appendices.appendix3.push(
                mapping::from_record(&record).map_err(parse_error)?),
            mapping::APPENDIX2_ROW => appendices.appendix2.rows.push(
                mapping::from_record(&record).map_err(parse_error)?),
            mapping::APPENDIX2_TOTALS => set_once(&mut appendix2_totals, &record)?,
            mapping::APPENDIX2_OTHER_INCOME => set_once(&mut appendices.appendix2_other_income, &record)?,

            _ => other_records.push(record),
        }
    }

    let header = header.ok_or_else(|| format!("{} record is missing", mapping::HEADER))?;

    if let Some(totals) = appendix2_totals {
        let rows = mem::take(&mut appendices.appendix2.rows);
        appendices.appendix2 = Appendix2 {rows, ..totals};
    }

    Ok(TaxDeclaration {
        envelope, header,
        section2: section2.unwrap_or_default(),
        appendices, other_records,
    })
}

fn set_once<T: RecordMapping>(target: &mut Option<T>, record: &Record) -> EmptyResult {
    if target.is_some() {
        return Err!("Got a duplicated {} record", record.name);
    }

    target.replace(mapping::from_record(record).map_err(|e| format!(
        "Failed to parse {} record: {}", record.name, e))?);

    Ok(())
}

fn parse_element(element: &BytesStart) -> GenericResult<Record> {
    let name = str::from_utf8(element.name().as_ref())?.to_owned();
    let mut attributes = Vec::new();

    for attribute in element.attributes() {
        let attribute = attribute?;
        let key = str::from_utf8(attribute.key.as_ref())?.to_owned();
        let value = escape::unescape(str::from_utf8(&attribute.value)?)?.into_owned();
        attributes.push((key, value));
    }

    Ok(Record {name, attributes})
}

fn serialize(declaration: &TaxDeclaration) -> GenericResult<Vec<u8>> {
    let envelope = &declaration.envelope;
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(new_element(&envelope.root)))?;
    writer.write_event(Event::Start(new_element(&envelope.form)))?;

    for record in records(declaration) {
        writer.write_event(Event::Empty(new_element(&record)))?;
    }

    writer.write_event(Event::End(BytesEnd::new(envelope.form.name.as_str())))?;
    writer.write_event(Event::End(BytesEnd::new(envelope.root.name.as_str())))?;

    let mut data = writer.into_inner();
    data.push(b'\n');

    Ok(data)
}

// Header goes first, unknown records keep their relative order, generated sections go last.
fn records(declaration: &TaxDeclaration) -> Vec<Record> {
    let appendices = &declaration.appendices;
    let appendix2 = &appendices.appendix2;

    let mut records = vec![mapping::to_record(&declaration.header)];
    records.extend(declaration.other_records.iter().cloned());
    records.push(mapping::to_record(&declaration.section2));

    records.extend(appendices.income_table.iter().map(mapping::to_record));
    records.extend(appendices.securities_list.iter().map(mapping::to_record));
    records.extend(appendices.appendix3.iter().map(mapping::to_record));
    records.extend(appendix2.rows.iter().map(mapping::to_record));

    if *appendix2 != Appendix2::default() {
        records.push(mapping::to_record(appendix2));
    }

    records.extend(appendices.appendix2_other_income.iter().map(mapping::to_record));

    records
}

fn new_element(record: &Record) -> BytesStart<'_> {
    let mut element = BytesStart::new(record.name.as_str());

    for (name, value) in &record.attributes {
        element.push_attribute((name.as_str(), value.as_str()));
    }

    element
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use matches::assert_matches;
    use pretty_assertions::assert_eq;

    use crate::declaration::{Appendix2Row, Appendix3Row, OtherIncomeRow};
    use crate::declaration::tests::template;

    use super::*;

    const TEMPLATE: &str = indoc!(r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <Pisemnost nazevSW="EPO MF ČR" verzeSW="41.6.1">
          <DPFDP5 verzePis="05.01">
            <VetaD dap_typ="B" rok="2018" c_ufo_cil="461"/>
            <VetaP jmeno="Jan" prijmeni="Novák"/>
            <VetaS kc_zd7="0" kc_zd8="0" kc_zd10="0"/>
          </DPFDP5>
        </Pisemnost>
    "#);

    #[test]
    fn parsing() {
        assert_eq!(parse(TEMPLATE).unwrap(), template());
    }

    #[test]
    fn serialization() {
        let mut declaration = parse(TEMPLATE).unwrap();
        declaration.header.year = Some(2019);
        declaration.section2.row38 = dec!(2300);

        declaration.appendices.appendix3.push(Appendix3Row {
            country: s!("US"),
            income: dec!(2300),
            tax: dec!(345),
            ..Default::default()
        });

        declaration.appendices.appendix2 = Appendix2 {
            rows: vec![Appendix2Row {
                code: s!("D"),
                name: s!("MSFT & co"),
                income: dec!(1380),
                expenses: dec!(1150),
                difference: dec!(230),
                ..Default::default()
            }],
            total_income: dec!(1380),
            total_expenses: dec!(1150),
            total_profit: dec!(230),
            ..Default::default()
        };
        declaration.section2.row40 = dec!(230);

        declaration.appendices.appendix2_other_income = Some(OtherIncomeRow {
            kind: s!("Prodej cenných papírů"),
            income: dec!(1380),
            expenses: dec!(1150),
            ..Default::default()
        });

        let data = String::from_utf8(serialize(&declaration).unwrap()).unwrap();
        assert_eq!(data, indoc!(r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <Pisemnost nazevSW="EPO MF ČR" verzeSW="41.6.1">
              <DPFDP5 verzePis="05.01">
                <VetaD rok="2019" dap_typ="B" c_ufo_cil="461"/>
                <VetaP jmeno="Jan" prijmeni="Novák"/>
                <VetaS kc_zd8="2300" kc_zd10="230" kc_zd7="0"/>
                <VetaL kod_stat="US" kc_prij="2300" kc_dan_zahr="345"/>
                <VetaJ kod_dr_prij10="D" druh_prij10="MSFT &amp; co" prijmy10="1380" vydaje10="1150" rozdil10="230"/>
                <VetaV kc_prij10="1380" kc_vyd10="1150" kc_zd10p="230"/>
                <VetaO druh_prij="Prodej cenných papírů" kc_prij="1380" kc_vyd="1150"/>
              </DPFDP5>
            </Pisemnost>
        "#));

        assert_eq!(parse(&data).unwrap(), declaration);
    }

    #[test]
    fn invalid_documents() {
        assert_matches!(parse("<Pisemnost></Pisemnost>"), Err(_));
        assert_matches!(parse(r#"<Pisemnost><DPFDP5><VetaS kc_zd8="0"/></DPFDP5></Pisemnost>"#), Err(_));
        assert_matches!(parse(r#"<Pisemnost><DPFDP5><VetaD rok="2018"/><VetaD rok="2019"/></DPFDP5></Pisemnost>"#), Err(_));
        assert_matches!(parse(r#"<Pisemnost><DPFDP5><VetaD rok="2018"><X/></VetaD></DPFDP5></Pisemnost>"#), Err(_));
    }

    #[test]
    fn saving() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("declaration.xml");
        let path = path.to_str().unwrap();

        let declaration = parse(TEMPLATE).unwrap();
        save(&declaration, path).unwrap();

        assert_eq!(read(path).unwrap(), declaration);
        assert!(!directory.path().join("declaration.xml.new").exists());
    }
}
