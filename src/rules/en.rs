//! English rule descriptions.
//!
//! Each constant is a complete description that
//! [`RuleBasedNumberFormat::new`](crate::RuleBasedNumberFormat::new) accepts.

/// Cardinal and ordinal spellout. `%spellout-numbering` is the default set.
pub const SPELLOUT: &str = r"
%spellout-numbering:
    -x: minus >>;
    x.x: =%spellout-cardinal=;
    0: =%spellout-cardinal=;
%spellout-cardinal:
    -x: minus >>;
    x.x: << point >>;
    zero; one; two; three; four; five; six; seven; eight; nine;
    ten; eleven; twelve; thirteen; fourteen; fifteen; sixteen;
        seventeen; eighteen; nineteen;
    20: twenty[->>];
    30: thirty[->>];
    40: forty[->>];
    50: fifty[->>];
    60: sixty[->>];
    70: seventy[->>];
    80: eighty[->>];
    90: ninety[->>];
    100: << hundred[ >>];
    1000: << thousand[ >>];
    1,000,000: << million[ >>];
    1,000,000,000: << billion[ >>];
    1,000,000,000,000: << trillion[ >>];
    1,000,000,000,000,000: << quadrillion[ >>];
    1,000,000,000,000,000,000: =#,##0=;
%spellout-ordinal:
    -x: minus >>;
    x.x: =#,##0.#=;
    zeroth; first; second; third; fourth; fifth; sixth; seventh; eighth; ninth;
    tenth; eleventh; twelfth;
    13: =%spellout-numbering=th;
    20: twen>%%tieth>;
    30: thir>%%tieth>;
    40: for>%%tieth>;
    50: fif>%%tieth>;
    60: six>%%tieth>;
    70: seven>%%tieth>;
    80: eigh>%%tieth>;
    90: nine>%%tieth>;
    100: <%spellout-numbering< hundred>%%th>;
    1000: <%spellout-numbering< thousand>%%th>;
    1,000,000: <%spellout-numbering< million>%%th>;
    1,000,000,000: <%spellout-numbering< billion>%%th>;
    1,000,000,000,000: <%spellout-numbering< trillion>%%th>;
    1,000,000,000,000,000: <%spellout-numbering< quadrillion>%%th>;
    1,000,000,000,000,000,000: =#,##0=$(ordinal,one{st}two{nd}few{rd}other{th})$;
%%tieth:
    0: tieth;
    1: ty-=%spellout-ordinal=;
%%th:
    0: th;
    1: ' =%spellout-ordinal=;
%%lenient-parse:
    & ' ' = '-' = ',';
";

/// Digit ordinals: "1st", "22nd", "103rd".
pub const ORDINAL: &str = r"
%digits-ordinal:
    -x: ->>;
    0: =#,##0=$(ordinal,one{st}two{nd}few{rd}other{th})$;
";

/// Durations given in seconds. `%in-numerals` ("1:02:20") is the default;
/// `%with-words` spells the units out.
pub const DURATION: &str = r"
%with-words:
    0 seconds; 1 second; =0= seconds;
    60/60: <%%min<[, >>];
    3600/60: <%%hr<[, >>>];
%%min:
    0 minutes; 1 minute; =0= minutes;
%%hr:
    0 hours; 1 hour; =0= hours;
%in-numerals:
    =0= sec.;
    60: =%%min-sec=;
    3600: =%%hr-min-sec=;
%%min-sec:
    0: :=00=;
    60/60: <0<>>;
%%hr-min-sec:
    0: :=00=;
    60/60: <00<>>;
    3600/60: <#,##0<:>>>;
";
