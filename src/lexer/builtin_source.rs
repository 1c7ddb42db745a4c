//! Built-in macro and inference rule text, carried over verbatim from
//! `rules.c`'s `MACROS`/`MACROS_2017`/`MACROS_2024`/`MACROS_EXT`/
//! `RULES_2017`/`RULES_2024`/`RULES` string tables. See SPEC_FULL.md §3,
//! "Built-in rule/macro text".

use crate::pragma::Standard;

const MACROS: &str = "\
CFLAGS=-O1
YACC=yacc
YFLAGS=
LEX=lex
LFLAGS=
AR=ar
ARFLAGS=-rv
LDFLAGS=
";

const MACROS_2017: &str = "\
CC=c99
FC=fort77
FFLAGS=-O1
";

const MACROS_2024: &str = "CC=c17\n";
const MACROS_EXT: &str = "CC=cc\n";

const RULES_2017: &str = "\
.SUFFIXES:.o .c .y .l .a .sh .f
.f.o:
	$(FC) $(FFLAGS) -c $<
.f.a:
	$(FC) -c $(FFLAGS) $<
	$(AR) $(ARFLAGS) $@ $*.o
	rm -f $*.o
.f:
	$(FC) $(FFLAGS) $(LDFLAGS) -o $@ $<
";

const RULES_2024: &str = ".SUFFIXES:.o .c .y .l .a .sh\n";

const RULES: &str = "\
.c.o:
	$(CC) $(CFLAGS) -c $<
.y.o:
	$(YACC) $(YFLAGS) $<
	$(CC) $(CFLAGS) -c y.tab.c
	rm -f y.tab.c
	mv y.tab.o $@
.y.c:
	$(YACC) $(YFLAGS) $<
	mv y.tab.c $@
.l.o:
	$(LEX) $(LFLAGS) $<
	$(CC) $(CFLAGS) -c lex.yy.c
	rm -f lex.yy.c
	mv lex.yy.o $@
.l.c:
	$(LEX) $(LFLAGS) $<
	mv lex.yy.c $@
.c.a:
	$(CC) -c $(CFLAGS) $<
	$(AR) $(ARFLAGS) $@ $*.o
	rm -f $*.o
.c:
	$(CC) $(CFLAGS) $(LDFLAGS) -o $@ $<
.sh:
	cp $< $@
	chmod a+x $@
";

/// Build the text of the virtual "built-in rules" makefile read before
/// any user makefile, as `main.c` does with `input(NULL)`. `norules`
/// corresponds to `-r`: macros are always emitted, but the inference
/// rule section is skipped.
pub fn builtin_rules_text(standard: Standard, norules: bool) -> String {
    let mut text = String::new();
    text.push_str(MACROS);
    text.push_str(match standard {
        Standard::Posix2017 => MACROS_2017,
        Standard::Posix2024 => MACROS_2024,
        Standard::Extended => MACROS_EXT,
    });
    if !norules {
        text.push_str(match standard {
            Standard::Posix2017 => RULES_2017,
            Standard::Posix2024 | Standard::Extended => RULES_2024,
        });
        text.push_str(RULES);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norules_keeps_macros_only() {
        let text = builtin_rules_text(Standard::Extended, true);
        assert!(text.contains("CC=cc"));
        assert!(!text.contains(".c.o:"));
    }

    #[test]
    fn posix2017_picks_fortran_rules() {
        let text = builtin_rules_text(Standard::Posix2017, false);
        assert!(text.contains("CC=c99"));
        assert!(text.contains(".f.o:"));
    }
}
