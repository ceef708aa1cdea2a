// src/region.rs

use serde::Serialize;
use std::{fmt, str::FromStr};

use crate::error::Error;

/// One of the 27 federative units. Declaration order is the processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RegionCode {
    AC,
    AL,
    AP,
    AM,
    BA,
    CE,
    DF,
    ES,
    GO,
    MA,
    MT,
    MS,
    MG,
    PA,
    PB,
    PR,
    PE,
    PI,
    RJ,
    RN,
    RS,
    RO,
    RR,
    SC,
    SP,
    SE,
    TO,
}

use RegionCode::*;

impl RegionCode {
    pub const ALL: [RegionCode; 27] = [
        AC, AL, AP, AM, BA, CE, DF, ES, GO, MA, MT, MS, MG, PA, PB, PR, PE, PI, RJ, RN, RS, RO,
        RR, SC, SP, SE, TO,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AC => "AC",
            AL => "AL",
            AP => "AP",
            AM => "AM",
            BA => "BA",
            CE => "CE",
            DF => "DF",
            ES => "ES",
            GO => "GO",
            MA => "MA",
            MT => "MT",
            MS => "MS",
            MG => "MG",
            PA => "PA",
            PB => "PB",
            PR => "PR",
            PE => "PE",
            PI => "PI",
            RJ => "RJ",
            RN => "RN",
            RS => "RS",
            RO => "RO",
            RR => "RR",
            SC => "SC",
            SP => "SP",
            SE => "SE",
            TO => "TO",
        }
    }

    /// Full name of the unit.
    pub fn name(&self) -> &'static str {
        match self {
            AC => "Acre",
            AL => "Alagoas",
            AP => "Amapá",
            AM => "Amazonas",
            BA => "Bahia",
            CE => "Ceará",
            DF => "Distrito Federal",
            ES => "Espírito Santo",
            GO => "Goiás",
            MA => "Maranhão",
            MT => "Mato Grosso",
            MS => "Mato Grosso do Sul",
            MG => "Minas Gerais",
            PA => "Pará",
            PB => "Paraíba",
            PR => "Paraná",
            PE => "Pernambuco",
            PI => "Piauí",
            RJ => "Rio de Janeiro",
            RN => "Rio Grande do Norte",
            RS => "Rio Grande do Sul",
            RO => "Rondônia",
            RR => "Roraima",
            SC => "Santa Catarina",
            SP => "São Paulo",
            SE => "Sergipe",
            TO => "Tocantins",
        }
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        RegionCode::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| Error::Config(format!("unknown region code {:?}", s)))
    }
}
